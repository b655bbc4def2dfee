//! Raster preparers for lidar GeoTIFFs and world-file PNGs
//!
//! Neither format is rewritten: the original file is placed on the server
//! as is and publishes a single layer named after its stem.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::formats::validation::{find_component, pre_read_validation, FormatValidator};
use crate::formats::{FilePreparer, FormatValidation, PrepareContext};
use crate::models::{PreparedFile, StyleCategory};

/// Extensions accepted as a PNG world file
pub const WORLD_FILE_EXTENSIONS: &[&str] = &["pgw", "pngw", "wld"];

/// First `YYYYMMDD` run in a file stem
pub fn date_from_stem(stem: &str) -> Option<NaiveDate> {
    let bytes = stem.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end - start >= 8 {
            if let Ok(date) = NaiveDate::parse_from_str(&stem[start..start + 8], "%Y%m%d") {
                return Some(date);
            }
        }
        start = end;
    }
    None
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}

fn single_layer(path: &Path, companions: Vec<PathBuf>) -> PreparedFile {
    let stem = stem_of(path);
    PreparedFile {
        path: path.to_path_buf(),
        companions,
        date: date_from_stem(&stem),
        layers: vec![stem],
        ranges: BTreeMap::new(),
        category: StyleCategory::Raster,
    }
}

/// Lidar flight GeoTIFF
pub struct GeoTiffPreparer;

impl FilePreparer for GeoTiffPreparer {
    fn prepare(&self, path: &Path, _ctx: &PrepareContext<'_>) -> Result<PreparedFile> {
        FormatValidator::validation_to_result(&self.validate(path), self.format_name())?;
        let prepared = single_layer(path, Vec::new());
        if prepared.date.is_none() {
            tracing::warn!("No YYYYMMDD date found in {}", path.display());
        }
        Ok(prepared)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["tif", "tiff"]
    }

    fn format_name(&self) -> &str {
        "GeoTIFF"
    }
}

/// PNG georeferenced by a world file
pub struct WorldImagePreparer;

impl WorldImagePreparer {
    fn world_file(path: &Path) -> Option<PathBuf> {
        WORLD_FILE_EXTENSIONS
            .iter()
            .find_map(|ext| find_component(path, ext))
    }
}

impl FilePreparer for WorldImagePreparer {
    fn prepare(&self, path: &Path, _ctx: &PrepareContext<'_>) -> Result<PreparedFile> {
        FormatValidator::validation_to_result(&self.validate(path), self.format_name())?;

        let mut companions = Vec::new();
        companions.extend(Self::world_file(path));
        companions.extend(find_component(path, "prj"));

        Ok(single_layer(path, companions))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["png"]
    }

    fn format_name(&self) -> &str {
        "WorldImage"
    }

    fn validate(&self, path: &Path) -> FormatValidation {
        let mut validation = pre_read_validation(path, self.supported_extensions());
        if !validation.is_valid() {
            return validation;
        }

        if Self::world_file(path).is_none() {
            validation.errors.push(format!(
                "Missing world file for {} (expected .pgw, .pngw or .wld)",
                path.display()
            ));
        }
        if find_component(path, "prj").is_none() {
            validation
                .warnings
                .push(format!("No .prj next to {}, GeoServer will guess the CRS", path.display()));
        }

        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ctx(dir: &Path) -> PrepareContext<'_> {
        PrepareContext {
            scratch_dir: dir,
            epsg: None,
            mask: None,
        }
    }

    #[test]
    fn test_date_from_stem() {
        assert_eq!(
            date_from_stem("USCATB20190418_SUPERsnow_depth"),
            NaiveDate::from_ymd_opt(2019, 4, 18)
        );
        assert_eq!(date_from_stem("flight_99999999_20200301"), NaiveDate::from_ymd_opt(2020, 3, 1));
        assert_eq!(date_from_stem("depth_2019"), None);
    }

    #[test]
    fn test_geotiff_prepare() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("USCATB20190418_SUPERsnow_depth.tif");
        fs::write(&path, b"II*\0").unwrap();

        let prepared = GeoTiffPreparer.prepare(&path, &ctx(temp_dir.path())).unwrap();
        assert_eq!(prepared.path, path);
        assert_eq!(prepared.layers, vec!["USCATB20190418_SUPERsnow_depth".to_string()]);
        assert_eq!(prepared.date_label(), "2019-04-18");
        assert!(prepared.companions.is_empty());
    }

    #[test]
    fn test_geotiff_rejects_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("depth.nc");
        fs::write(&path, b"CDF").unwrap();
        assert!(GeoTiffPreparer.prepare(&path, &ctx(temp_dir.path())).is_err());
    }

    #[test]
    fn test_world_image_requires_world_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hillshade.png");
        fs::write(&path, b"\x89PNG").unwrap();

        let validation = WorldImagePreparer.validate(&path);
        assert!(!validation.is_valid());
        assert!(validation.errors[0].contains("world file"));

        fs::write(temp_dir.path().join("hillshade.pgw"), "1\n0\n0\n-1\n0\n0\n").unwrap();
        let prepared = WorldImagePreparer.prepare(&path, &ctx(temp_dir.path())).unwrap();
        assert_eq!(prepared.companions.len(), 1);
        assert_eq!(prepared.layers, vec!["hillshade".to_string()]);
    }
}
