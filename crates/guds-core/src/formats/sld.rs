//! SLD style documents

use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

use crate::error::{GudsError, Result};
use crate::formats::validation::{pre_read_validation, FormatValidator};

const FORMAT: &str = "SLD";

/// What a style document declares about itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SldSummary {
    /// `<Name>` of the first `<NamedLayer>`
    pub named_layer: Option<String>,
    /// `<Name>` of the first `<UserStyle>`
    pub user_style: Option<String>,
}

/// Check that `xml` is a well-formed `StyledLayerDescriptor`
pub fn validate_sld(xml: &str) -> Result<SldSummary> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut summary = SldSummary::default();
    let mut path: Vec<String> = Vec::new();
    let mut saw_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if path.is_empty() {
                    if name != "StyledLayerDescriptor" {
                        return Err(GudsError::format(
                            FORMAT,
                            format!("root element is <{}>, expected <StyledLayerDescriptor>", name),
                        ));
                    }
                    saw_root = true;
                }
                path.push(name);
            }
            Ok(Event::Empty(e)) if path.is_empty() => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                return Err(GudsError::format(FORMAT, format!("empty root element <{}>", name)));
            }
            Ok(Event::Text(t)) => {
                let parent = path.iter().rev().nth(1).map(String::as_str);
                if path.last().map(String::as_str) == Some("Name") {
                    let text = t
                        .unescape()
                        .map_err(|e| GudsError::format(FORMAT, e.to_string()))?
                        .trim()
                        .to_string();
                    match parent {
                        Some("NamedLayer") if summary.named_layer.is_none() => {
                            summary.named_layer = Some(text)
                        }
                        Some("UserStyle") if summary.user_style.is_none() => {
                            summary.user_style = Some(text)
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(GudsError::format(
                    FORMAT,
                    format!("XML parsing error at position {}: {}", reader.buffer_position(), e),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(GudsError::format(FORMAT, "document has no root element"));
    }
    if !path.is_empty() {
        return Err(GudsError::format(FORMAT, format!("unclosed element <{}>", path.join("/"))));
    }

    Ok(summary)
}

/// Read and validate a `.sld` file, returning its bytes
pub fn read_sld(path: &Path) -> Result<(Vec<u8>, SldSummary)> {
    FormatValidator::validation_to_result(&pre_read_validation(path, &["sld"]), FORMAT)?;
    let xml = std::fs::read_to_string(path)?;
    let summary = validate_sld(&xml)?;
    Ok((xml.into_bytes(), summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWE_STYLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<StyledLayerDescriptor version="1.0.0"
    xmlns="http://www.opengis.net/sld" xmlns:ogc="http://www.opengis.net/ogc">
  <NamedLayer>
    <Name>swe</Name>
    <UserStyle>
      <Name>swe_ramp</Name>
      <FeatureTypeStyle>
        <Rule><RasterSymbolizer><Opacity>1.0</Opacity></RasterSymbolizer></Rule>
      </FeatureTypeStyle>
    </UserStyle>
  </NamedLayer>
</StyledLayerDescriptor>"#;

    #[test]
    fn test_validate_sld() {
        let summary = validate_sld(SWE_STYLE).unwrap();
        assert_eq!(summary.named_layer.as_deref(), Some("swe"));
        assert_eq!(summary.user_style.as_deref(), Some("swe_ramp"));
    }

    #[test]
    fn test_prefixed_root() {
        let xml = r#"<sld:StyledLayerDescriptor xmlns:sld="http://www.opengis.net/sld"><sld:NamedLayer><sld:Name>depth</sld:Name></sld:NamedLayer></sld:StyledLayerDescriptor>"#;
        let summary = validate_sld(xml).unwrap();
        assert_eq!(summary.named_layer.as_deref(), Some("depth"));
    }

    #[test]
    fn test_rejects_wrong_root() {
        let err = validate_sld("<kml><Document/></kml>").unwrap_err();
        assert!(err.to_string().contains("StyledLayerDescriptor"));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(validate_sld("<StyledLayerDescriptor><NamedLayer></StyledLayerDescriptor>").is_err());
        assert!(validate_sld("").is_err());
    }
}
