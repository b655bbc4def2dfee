use serde::Serialize;
use std::path::PathBuf;

use super::upload::{UploadType, ValueRange};

/// A layer created on the server
#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    pub name: String,
    pub native_name: String,
    pub title: String,
    pub range: Option<ValueRange>,
    pub styles: Vec<String>,
}

/// Result of one upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub basin: String,
    pub upload_type: UploadType,
    pub store: String,
    pub remote_path: String,
    pub created_basin: bool,
    pub layers: Vec<LayerReport>,
    /// Layers that already existed and were left alone
    pub skipped_layers: Vec<String>,
    pub latest_store: Option<String>,
    pub latest_layers: Vec<String>,
    pub elapsed_secs: f64,
}

/// Result of a download
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub basin: String,
    pub resource: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Result of a style submission
#[derive(Debug, Clone, Default, Serialize)]
pub struct StyleReport {
    pub uploaded: Vec<String>,
    pub replaced: Vec<String>,
    pub skipped: Vec<String>,
}
