use clap::Parser;
use guds_core::config::DEFAULT_CREDENTIALS_FILE;
use guds_core::models::{UploadType, KNOWN_BASINS};
use std::path::PathBuf;

/// GUDS - Geoserver Upload/Download Script
#[derive(Parser, Debug)]
#[command(name = "guds")]
#[command(
    about = "Upload netCDF model output, topo images, lidar flights, shapefiles and styles to a GeoServer",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Paths to the files to upload (or SLD files with --data_type styles)
    #[arg(short = 'f', long = "files", num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Basin (GeoServer workspace) the data is associated with
    #[arg(short = 'b', long = "basin", value_parser = clap::builder::PossibleValuesParser::new(KNOWN_BASINS))]
    pub basin: Option<String>,

    /// JSON file with the GeoServer url and credentials
    #[arg(short = 'c', long = "credentials", default_value_os_t = default_credentials())]
    pub credentials: PathBuf,

    /// Kind of data being uploaded or downloaded
    #[arg(short = 't', long = "data_type", default_value = "modeled", value_parser = parse_upload_type)]
    pub data_type: UploadType,

    /// EPSG code for netCDF files without a projection variable
    #[arg(short = 'e', long = "espg")]
    pub epsg: Option<u32>,

    /// netCDF file whose mask variable is applied to the data
    #[arg(short = 'm', long = "mask")]
    pub mask: Option<PathBuf>,

    /// Write a blank geoserver.json into the current directory and exit
    #[arg(long = "write_json")]
    pub write_json: bool,

    /// Log every request and response status
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Answer yes to every prompt
    #[arg(short = 'y', long = "bypass")]
    pub bypass: bool,

    /// Keep the scratch directory after the upload
    #[arg(long = "no_cleanup")]
    pub no_cleanup: bool,

    /// Download the file for this date instead of uploading
    #[arg(long = "download", value_name = "DATE")]
    pub download: Option<String>,

    /// Also publish the upload under latest_* names
    #[arg(long = "latest")]
    pub latest: bool,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show planned writes without executing them
    #[arg(long = "dry_run")]
    pub dry_run: bool,

    /// Fail on unexpected response statuses instead of logging them
    #[arg(long = "strict_status")]
    pub strict_status: bool,

    /// Override the GeoServer url from the credentials file
    #[arg(long = "url")]
    pub url: Option<String>,

    /// Request timeout in seconds, overriding timeout_secs
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,
}

fn default_credentials() -> PathBuf {
    PathBuf::from(".").join(DEFAULT_CREDENTIALS_FILE)
}

fn parse_upload_type(s: &str) -> Result<UploadType, String> {
    s.parse::<UploadType>().map_err(|e| e.to_string())
}
