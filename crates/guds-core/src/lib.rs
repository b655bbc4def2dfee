//! GUDS Core - GeoServer publishing pipeline
//!
//! Domain models, configuration, transport ports and the upload/download
//! orchestration used by the `guds` command-line tool.

pub mod config;
pub mod error;
pub mod formats;
pub mod memory;
pub mod models;
pub mod naming;
pub mod ports;
pub mod publish;
pub mod rest;

pub use error::{GudsError, Result};
pub use publish::Publisher;
