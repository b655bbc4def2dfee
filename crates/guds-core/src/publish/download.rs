//! Downloads from the GeoServer resource tree

use chrono::{DateTime, NaiveDate};
use std::path::Path;

use super::Publisher;
use crate::error::{GudsError, Result};
use crate::models::{DownloadReport, UploadType};
use crate::ports::Transport;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// Parse a user supplied date
///
/// Accepts `YYYY-MM-DD`, `YYYYMMDD`, `YYYY/MM/DD` and RFC 3339 timestamps.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let text = input.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.date_naive());
    }
    Err(GudsError::InvalidInput(format!(
        "unrecognized date '{}', use YYYY-MM-DD",
        input
    )))
}

/// Resource path and local file name for a download
pub fn download_resource(basin: &str, date: NaiveDate, download_type: UploadType) -> Result<(String, String)> {
    match download_type {
        UploadType::Modeled => {
            let name = format!("masked_snow_{}.nc", date.format("%Y%m%d"));
            Ok((format!("resource/basins/{}/{}", basin, name), name))
        }
        other => {
            tracing::error!("{} data downloads have not been developed yet!", other);
            Err(GudsError::Unsupported(format!("{} downloads", other)))
        }
    }
}

impl<T: Transport> Publisher<T> {
    /// Stream a dated file from a basin into `dest_dir`
    pub async fn download(
        &self,
        basin: &str,
        date: &str,
        download_type: UploadType,
        dest_dir: &Path,
    ) -> Result<DownloadReport> {
        let basin = basin.trim().to_lowercase();
        if basin.is_empty() {
            return Err(GudsError::InvalidInput("a basin is required to download".to_string()));
        }

        let date = parse_date(date)?;
        let (resource, name) = download_resource(&basin, date, download_type)?;
        tracing::info!(
            "Download Requested. Attempting to download {} from the {}.",
            name,
            basin
        );

        let path = dest_dir.join(&name);
        let bytes = self.transport.grab(&resource, &path).await?;
        tracing::info!("Downloaded {} bytes to {}", bytes, path.display());

        Ok(DownloadReport {
            basin,
            resource,
            path,
            bytes,
        })
    }
}
