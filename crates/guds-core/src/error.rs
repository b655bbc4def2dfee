//! Error types for GUDS

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GudsError {
    // Input errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid upload type '{0}'. Use flight, topo, shapefile, modeled, styles or png")]
    UnsupportedUploadType(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    // Remote errors
    #[error("Remote resource not found (404): {resource}")]
    RemoteNotFound { resource: String },

    #[error("Unexpected status {status} for {resource}")]
    UnexpectedStatus { resource: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // Pipeline errors
    #[error("Aborted: {0}")]
    Aborted(String),

    #[error("{path} has no projection variable and no EPSG code was given")]
    MissingProjection { path: PathBuf },

    #[error("No variables found in {path}")]
    NoVariables { path: PathBuf },

    #[error("Invalid {format} file: {message}")]
    FormatError { format: String, message: String },

    #[error("netCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GudsError {
    fn from(e: serde_json::Error) -> Self {
        GudsError::Serialization(e.to_string())
    }
}

impl GudsError {
    pub(crate) fn format(format: &str, message: impl Into<String>) -> Self {
        GudsError::FormatError {
            format: format.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GudsError>;
