use guds_core::config::ConfigSource;
use guds_core::models::{LayerReport, UploadReport};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

/// One row of the created-layers table
#[derive(Debug, Tabled)]
pub struct LayerRow {
    #[tabled(rename = "Layer")]
    pub name: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Min")]
    pub min: String,
    #[tabled(rename = "Max")]
    pub max: String,
    #[tabled(rename = "Styles")]
    pub styles: String,
}

impl From<&LayerReport> for LayerRow {
    fn from(layer: &LayerReport) -> Self {
        let (min, max) = match layer.range {
            Some(range) => (range.min.to_string(), range.max.to_string()),
            None => ("-".to_string(), "-".to_string()),
        };
        Self {
            name: layer.name.clone(),
            title: layer.title.clone(),
            min,
            max,
            styles: layer.styles.join(", "),
        }
    }
}

/// One credentials key and where its value came from
#[derive(Debug, Tabled)]
pub struct SourceRow {
    #[tabled(rename = "Setting")]
    pub setting: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

pub fn source_rows(map: BTreeMap<String, (String, ConfigSource)>) -> Vec<SourceRow> {
    map.into_iter()
        .map(|(setting, (value, source))| SourceRow {
            setting,
            value,
            source: match source {
                ConfigSource::Default => "default",
                ConfigSource::File => "file",
                ConfigSource::Environment => "env",
                ConfigSource::Cli => "cli",
            }
            .to_string(),
        })
        .collect()
}

/// Output for a run of uploads
#[derive(Debug, Serialize)]
pub struct UploadOutput {
    pub uploads: Vec<UploadReport>,
}

/// Output for --write_json
#[derive(Debug, Serialize)]
pub struct WriteJsonOutput {
    pub path: String,
    pub written: bool,
}
