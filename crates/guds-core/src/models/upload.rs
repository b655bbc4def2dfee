use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::catalog::{StoreKind, StyleCategory};
use crate::error::GudsError;

/// Basins (GeoServer workspaces) the tool publishes to
pub const KNOWN_BASINS: &[&str] =
    &["brb", "kaweah", "kings", "lakes", "merced", "sanjoaquin", "tuolumne"];

/// Kind of data being uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadType {
    /// Lidar flight GeoTIFF
    Flight,
    /// Static topographic netCDF
    Topo,
    /// ESRI shapefile
    Shapefile,
    /// Modeled snowpack netCDF
    Modeled,
    /// SLD style definitions
    Styles,
    /// PNG with a world file
    Png,
}

impl UploadType {
    pub const ALL: [UploadType; 6] = [
        UploadType::Flight,
        UploadType::Topo,
        UploadType::Shapefile,
        UploadType::Modeled,
        UploadType::Styles,
        UploadType::Png,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadType::Flight => "flight",
            UploadType::Topo => "topo",
            UploadType::Shapefile => "shapefile",
            UploadType::Modeled => "modeled",
            UploadType::Styles => "styles",
            UploadType::Png => "png",
        }
    }

    /// Whether the file goes through netCDF preparation
    pub fn is_netcdf(&self) -> bool {
        matches!(self, UploadType::Topo | UploadType::Modeled)
    }

    /// Store kind holding this upload, `None` for styles
    pub fn store_kind(&self) -> Option<StoreKind> {
        match self {
            UploadType::Shapefile => Some(StoreKind::Data),
            UploadType::Styles => None,
            _ => Some(StoreKind::Coverage),
        }
    }

    /// GeoServer store type name
    pub fn store_type(&self) -> Option<&'static str> {
        match self {
            UploadType::Topo | UploadType::Modeled => Some("NetCDF"),
            UploadType::Flight => Some("GeoTIFF"),
            UploadType::Png => Some("WorldImage"),
            UploadType::Shapefile => Some("Shapefile"),
            UploadType::Styles => None,
        }
    }

    /// Content type used when placing the file in the resource tree
    pub fn content_type(&self) -> &'static str {
        match self {
            UploadType::Topo | UploadType::Modeled => "application/x-netcdf",
            UploadType::Flight => "image/tiff",
            UploadType::Png => "image/png",
            UploadType::Styles => "application/vnd.ogc.sld+xml",
            UploadType::Shapefile => "application/octet-stream",
        }
    }
}

impl fmt::Display for UploadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadType {
    type Err = GudsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UploadType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GudsError::UnsupportedUploadType(s.to_string()))
    }
}

/// One file to publish into a basin
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub basin: String,
    pub file: PathBuf,
    pub upload_type: UploadType,
    /// EPSG code injected when the netCDF carries no projection
    pub epsg: Option<u32>,
    /// netCDF whose `mask` variable is multiplied into the data
    pub mask: Option<PathBuf>,
    /// Also publish `latest_*` aliases
    pub latest: bool,
}

impl UploadRequest {
    pub fn new(basin: impl Into<String>, file: impl Into<PathBuf>, upload_type: UploadType) -> Self {
        Self {
            basin: basin.into(),
            file: file.into(),
            upload_type,
            epsg: None,
            mask: None,
            latest: false,
        }
    }

    pub fn with_epsg(mut self, epsg: Option<u32>) -> Self {
        self.epsg = epsg;
        self
    }

    pub fn with_mask(mut self, mask: Option<PathBuf>) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }
}

/// Minimum and maximum finite value of a variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Range over finite values, skipping `fill` cells
    pub fn from_values(values: &[f64], fill: Option<f64>) -> Option<Self> {
        let mut range: Option<ValueRange> = None;
        for &v in values {
            if !v.is_finite() || fill.is_some_and(|f| v == f) {
                continue;
            }
            range = Some(match range {
                None => ValueRange { min: v, max: v },
                Some(r) => ValueRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                },
            });
        }
        range
    }
}

/// A local file ready to be placed on the server
///
/// Carries everything later pipeline steps need from preparation, so nothing
/// is kept on the publisher between uploads.
#[derive(Debug, Clone)]
pub struct PreparedFile {
    /// File to upload (scratch copy for netCDF, original otherwise)
    pub path: PathBuf,
    /// Extra files placed alongside (world files, shapefile components)
    pub companions: Vec<PathBuf>,
    /// Data date, if known
    pub date: Option<NaiveDate>,
    /// Layers to publish, in file order
    pub layers: Vec<String>,
    /// Value range per layer
    pub ranges: BTreeMap<String, ValueRange>,
    /// Default style family for the layers
    pub category: StyleCategory,
}

impl PreparedFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string()
    }

    pub fn stem(&self) -> String {
        let name = self.file_name();
        name.split('.').next().unwrap_or_default().to_string()
    }

    /// Date as `YYYY-MM-DD`, empty when unknown
    pub fn date_label(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_type_parse() {
        assert_eq!("modeled".parse::<UploadType>().unwrap(), UploadType::Modeled);
        assert_eq!("PNG".parse::<UploadType>().unwrap(), UploadType::Png);
        assert!(matches!(
            "raster".parse::<UploadType>(),
            Err(GudsError::UnsupportedUploadType(_))
        ));
    }

    #[test]
    fn test_store_kinds() {
        assert_eq!(UploadType::Topo.store_kind(), Some(StoreKind::Coverage));
        assert_eq!(UploadType::Shapefile.store_kind(), Some(StoreKind::Data));
        assert_eq!(UploadType::Styles.store_kind(), None);
        assert_eq!(UploadType::Png.store_type(), Some("WorldImage"));
    }

    #[test]
    fn test_value_range_skips_nan_and_fill() {
        let values = [f64::NAN, -9999.0, 2.5, 0.0, 7.0];
        let range = ValueRange::from_values(&values, Some(-9999.0)).unwrap();
        assert_eq!(range, ValueRange { min: 0.0, max: 7.0 });

        assert!(ValueRange::from_values(&[f64::NAN], None).is_none());
        assert!(ValueRange::from_values(&[], None).is_none());
    }

    #[test]
    fn test_prepared_file_names() {
        let prepared = PreparedFile {
            path: PathBuf::from("tmp/masked_snow_20190418.nc"),
            companions: Vec::new(),
            date: NaiveDate::from_ymd_opt(2019, 4, 18),
            layers: vec!["specific_mass".to_string()],
            ranges: BTreeMap::new(),
            category: StyleCategory::Raster,
        };
        assert_eq!(prepared.file_name(), "masked_snow_20190418.nc");
        assert_eq!(prepared.stem(), "masked_snow_20190418");
        assert_eq!(prepared.date_label(), "2019-04-18");
    }
}
