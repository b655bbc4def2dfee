//! Shapefile preparer
//!
//! A shapefile is several sibling files (.shp, .shx, .dbf, optional .prj)
//! that are placed together in one directory on the server.

use shapefile::{ShapeReader, ShapeType};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{GudsError, Result};
use crate::formats::validation::{find_component, FormatValidator};
use crate::formats::{FilePreparer, FormatValidation, PrepareContext};
use crate::models::{PreparedFile, StyleCategory};

const REQUIRED_COMPONENTS: &[&str] = &["shp", "shx", "dbf"];
const OPTIONAL_COMPONENTS: &[&str] = &["prj", "cpg"];

/// Shapefile preparer
pub struct ShapefilePreparer;

impl ShapefilePreparer {
    /// Style family for the geometry stored in the .shp header
    fn category(&self, path: &Path) -> Result<StyleCategory> {
        let reader = ShapeReader::from_path(path).map_err(|e| GudsError::FormatError {
            format: "Shapefile".to_string(),
            message: format!("Failed to open Shapefile: {}", e),
        })?;

        let category = match reader.header().shape_type {
            ShapeType::Point
            | ShapeType::PointZ
            | ShapeType::PointM
            | ShapeType::Multipoint
            | ShapeType::MultipointZ
            | ShapeType::MultipointM => StyleCategory::Point,
            ShapeType::Polyline | ShapeType::PolylineZ | ShapeType::PolylineM => StyleCategory::Line,
            ShapeType::Polygon | ShapeType::PolygonZ | ShapeType::PolygonM | ShapeType::Multipatch => {
                StyleCategory::Polygon
            }
            ShapeType::NullShape => {
                return Err(GudsError::FormatError {
                    format: "Shapefile".to_string(),
                    message: format!("{} holds no geometry", path.display()),
                })
            }
        };
        Ok(category)
    }

    /// Every component present on disk except the .shp itself
    fn companions(&self, path: &Path) -> Vec<PathBuf> {
        REQUIRED_COMPONENTS
            .iter()
            .chain(OPTIONAL_COMPONENTS)
            .filter(|ext| **ext != "shp")
            .filter_map(|ext| find_component(path, ext))
            .collect()
    }
}

impl FilePreparer for ShapefilePreparer {
    fn prepare(&self, path: &Path, _ctx: &PrepareContext<'_>) -> Result<PreparedFile> {
        FormatValidator::validation_to_result(&self.validate(path), self.format_name())?;

        let category = self.category(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        Ok(PreparedFile {
            path: path.to_path_buf(),
            companions: self.companions(path),
            date: None,
            layers: vec![name],
            ranges: BTreeMap::new(),
            category,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }

    fn validate(&self, path: &Path) -> FormatValidation {
        let validation = FormatValidator::merge_validations(vec![
            FormatValidator::validate_file_exists(path),
            FormatValidator::validate_extension(path, self.supported_extensions()),
        ]);
        if !validation.is_valid() {
            return validation;
        }

        let components = FormatValidator::validate_component_files(
            &path.with_extension(""),
            REQUIRED_COMPONENTS,
            &["prj"],
        );
        FormatValidator::merge_validations(vec![validation, components])
    }
}
