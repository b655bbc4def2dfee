//! File preparation for each upload type
//!
//! Every uploadable format implements `FilePreparer`. Preparation turns a
//! local file into a `PreparedFile`: the path to place on the server, its
//! companion files, the data date, the layers to publish and their value
//! ranges.

use std::path::Path;

use crate::error::{GudsError, Result};
use crate::models::{PreparedFile, UploadType};

pub mod cf_time;
pub mod nc;
pub mod projection;
pub mod raster;
pub mod shapefile;
pub mod sld;
pub mod validation;

use validation::pre_read_validation;

/// Inputs shared by every preparer
#[derive(Debug, Clone, Copy)]
pub struct PrepareContext<'a> {
    /// Directory for transformed copies
    pub scratch_dir: &'a Path,
    /// EPSG code to inject when a netCDF has no projection
    pub epsg: Option<u32>,
    /// netCDF holding a `mask` variable
    pub mask: Option<&'a Path>,
}

/// Preparer trait that all upload formats implement
pub trait FilePreparer: Send + Sync {
    /// Prepare the file for placement on the server
    fn prepare(&self, path: &Path, ctx: &PrepareContext<'_>) -> Result<PreparedFile>;

    /// Get supported file extensions (e.g., ["tif", "tiff"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name (e.g., "GeoTIFF")
    fn format_name(&self) -> &str;

    /// Validate file structure without preparing it
    fn validate(&self, path: &Path) -> FormatValidation {
        pre_read_validation(path, self.supported_extensions())
    }
}

/// Result of format validation
#[derive(Debug, Clone, Default)]
pub struct FormatValidation {
    /// Validation errors that prevent preparation
    pub errors: Vec<String>,

    /// Warnings that don't prevent preparation but indicate potential issues
    pub warnings: Vec<String>,
}

impl FormatValidation {
    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Pick the preparer for an upload type
pub fn preparer_for(upload_type: UploadType) -> Result<Box<dyn FilePreparer>> {
    match upload_type {
        UploadType::Modeled => Ok(Box::new(nc::NetCdfPreparer::modeled())),
        UploadType::Topo => Ok(Box::new(nc::NetCdfPreparer::topo())),
        UploadType::Flight => Ok(Box::new(raster::GeoTiffPreparer)),
        UploadType::Png => Ok(Box::new(raster::WorldImagePreparer)),
        UploadType::Shapefile => Ok(Box::new(shapefile::ShapefilePreparer)),
        UploadType::Styles => Err(GudsError::InvalidInput(
            "styles are submitted with submit_styles, not uploaded as data".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preparer_for() {
        assert_eq!(preparer_for(UploadType::Flight).unwrap().format_name(), "GeoTIFF");
        assert_eq!(preparer_for(UploadType::Png).unwrap().format_name(), "WorldImage");
        assert_eq!(preparer_for(UploadType::Modeled).unwrap().format_name(), "NetCDF");
        assert_eq!(preparer_for(UploadType::Shapefile).unwrap().supported_extensions(), &["shp"]);
        assert!(preparer_for(UploadType::Styles).is_err());
    }
}
