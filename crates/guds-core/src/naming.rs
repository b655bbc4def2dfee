//! Layer, title and store naming rules

use std::path::Path;

use crate::models::UploadType;

/// Variable names renamed on publish
const REMAP: &[(&str, &str)] = &[
    ("snow_density", "density"),
    ("specific_mass", "SWE"),
    ("thickness", "depth"),
];

/// Keywords linking style names to layer names
pub const STYLE_KEYWORDS: &[&str] = &["depth", "density", "swe", "dem", "veg", "height", "mask"];

/// Style appended to every match list when the server has it
pub const DYNAMIC_DEFAULT_STYLE: &str = "dynamic_default";

/// Native layer name: spaces to underscores, hyphens dropped
pub fn native_name(layer: &str) -> String {
    layer.replace(' ', "_").replace('-', "")
}

/// Published name before the date suffix
pub fn canonical_name(native: &str) -> String {
    REMAP
        .iter()
        .find(|(from, _)| *from == native)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| native.to_string())
}

/// Title-case like Python's `str.title()`
///
/// The first letter of every alphabetic run is upper-cased and the rest
/// lower-cased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn join_words(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Human readable layer title
///
/// `date` may be empty when the data carries none.
pub fn derive_title(basin: &str, date: &str, canonical: &str) -> String {
    if canonical.eq_ignore_ascii_case("swe") {
        let basin = title_case(basin);
        let upper = canonical.to_uppercase();
        return join_words(&[basin.as_str(), date, upper.as_str()]).replace('_', " ");
    }

    let lower = canonical.to_ascii_lowercase();
    if let Some(idx) = lower.find("super") {
        // Lidar flight products
        let rest = format!("{}{}", &canonical[..idx], &canonical[idx + "super".len()..]);
        let rest = title_case(rest.replace('_', " ").trim());
        let basin = title_case(basin);
        return join_words(&[basin.as_str(), date, "Lidar Flight", rest.as_str()]);
    }

    title_case(&join_words(&[basin, date, canonical]).replace('_', " "))
}

/// Date digits appended to published names
pub fn date_digits(date: &str) -> String {
    date.replace('-', "")
}

/// Published layer name: canonical name plus date digits
pub fn published_name(canonical: &str, date: &str) -> String {
    format!("{}{}", canonical, date_digits(date))
}

/// Alias name for the most recent upload
pub fn latest_name(name: &str) -> String {
    let stripped: String = name.chars().filter(|c| !c.is_ascii_digit()).collect();
    format!("latest_{}", stripped.trim_end_matches('_'))
}

/// Store name for an upload
///
/// `stem` is the file name of the prepared file up to its first dot.
pub fn store_name(basin: &str, upload_type: UploadType, stem: &str) -> String {
    match upload_type {
        UploadType::Topo => format!("{}_topo", basin),
        _ => format!("{}_{}", basin, stem),
    }
}

/// Style name for an SLD file: the file name up to its first dot
pub fn style_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or_default()
        .to_string()
}

/// Styles sharing a keyword with the layer, plus the dynamic default
pub fn matching_styles(available: &[String], layer: &str) -> Vec<String> {
    let layer = layer.to_lowercase();
    let mut result: Vec<String> = Vec::new();

    for key in STYLE_KEYWORDS {
        if !layer.contains(key) {
            continue;
        }
        for style in available {
            if style.to_lowercase().contains(key) && !result.contains(style) {
                result.push(style.clone());
            }
        }
    }

    if available.iter().any(|s| s == DYNAMIC_DEFAULT_STYLE)
        && !result.iter().any(|s| s == DYNAMIC_DEFAULT_STYLE)
    {
        result.push(DYNAMIC_DEFAULT_STYLE.to_string());
    }

    result
}
