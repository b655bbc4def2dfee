//! Integration tests for netCDF preparation
//!
//! Fixtures are written with the netcdf crate into temporary directories.

mod common;

use chrono::{Local, NaiveDate};
use guds_core::formats::nc::NetCdfPreparer;
use guds_core::formats::{FilePreparer, PrepareContext};
use guds_core::models::ValueRange;
use guds_core::GudsError;
use tempfile::TempDir;

use common::{read_f32, str_attr, variable_names, write_mask, write_modeled, write_topo};

fn context(scratch: &std::path::Path) -> PrepareContext<'_> {
    PrepareContext {
        scratch_dir: scratch,
        epsg: None,
        mask: None,
    }
}

#[test]
fn test_modeled_keeps_allow_listed_variables() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_modeled(temp_dir.path(), "snow.nc", true);
    let scratch = temp_dir.path().join("tmp");

    let prepared = NetCdfPreparer::modeled()
        .prepare(&source, &context(&scratch))
        .unwrap();

    assert_eq!(prepared.file_name(), "snow_20190418.nc");
    assert_eq!(prepared.stem(), "snow_20190418");
    assert_eq!(prepared.date, NaiveDate::from_ymd_opt(2019, 4, 18));
    assert_eq!(prepared.layers, vec!["specific_mass".to_string(), "thickness".to_string()]);
    assert!(prepared.path.starts_with(&scratch));

    let names = variable_names(&prepared.path);
    assert!(names.contains(&"specific_mass".to_string()));
    assert!(names.contains(&"projection".to_string()));
    assert!(!names.contains(&"liquid_water".to_string()));
}

#[test]
fn test_modeled_ranges_skip_nan_and_fill() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_modeled(temp_dir.path(), "snow.nc", true);
    let scratch = temp_dir.path().join("tmp");

    let prepared = NetCdfPreparer::modeled()
        .prepare(&source, &context(&scratch))
        .unwrap();

    assert_eq!(
        prepared.ranges.get("specific_mass"),
        Some(&ValueRange { min: 0.0, max: 812.5 })
    );
    assert_eq!(
        prepared.ranges.get("thickness"),
        Some(&ValueRange { min: 0.5, max: 2.5 })
    );
    assert!(!prepared.ranges.contains_key("x"));
}

#[test]
fn test_mask_file_multiplies_data() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_modeled(temp_dir.path(), "snow.nc", true);
    let mask = write_mask(temp_dir.path(), "mask.nc");
    let scratch = temp_dir.path().join("tmp");

    let ctx = PrepareContext {
        mask: Some(mask.as_path()),
        ..context(&scratch)
    };
    let prepared = NetCdfPreparer::modeled().prepare(&source, &ctx).unwrap();

    assert_eq!(prepared.file_name(), "masked_snow_20190418.nc");
    assert_eq!(
        prepared.ranges.get("specific_mass"),
        Some(&ValueRange { min: 0.0, max: 10.0 })
    );

    let swe = read_f32(&prepared.path, "specific_mass");
    assert_eq!(swe[1], 0.0);
    assert!(swe[2].is_nan());
    assert_eq!(swe[5], 0.0);

    // Fill cells are left alone
    let depth = read_f32(&prepared.path, "thickness");
    assert_eq!(depth[0], -9999.0);
    assert_eq!(depth[1], 0.0);
}

#[test]
fn test_missing_projection_requires_epsg() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_modeled(temp_dir.path(), "snow.nc", false);
    let scratch = temp_dir.path().join("tmp");

    let result = NetCdfPreparer::modeled().prepare(&source, &context(&scratch));
    assert!(matches!(result, Err(GudsError::MissingProjection { .. })));
}

#[test]
fn test_projection_injected_from_epsg() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_modeled(temp_dir.path(), "snow.nc", false);
    let scratch = temp_dir.path().join("tmp");

    let ctx = PrepareContext {
        epsg: Some(32611),
        ..context(&scratch)
    };
    let prepared = NetCdfPreparer::modeled().prepare(&source, &ctx).unwrap();

    assert!(variable_names(&prepared.path).contains(&"projection".to_string()));
    assert_eq!(
        str_attr(&prepared.path, "projection", "epsg_code").as_deref(),
        Some("EPSG:32611")
    );
    assert_eq!(
        str_attr(&prepared.path, "specific_mass", "grid_mapping").as_deref(),
        Some("projection")
    );
}

#[test]
fn test_topo_self_masks_and_keeps_everything() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_topo(temp_dir.path(), "topo.nc");
    let scratch = temp_dir.path().join("tmp");

    let prepared = NetCdfPreparer::topo()
        .prepare(&source, &context(&scratch))
        .unwrap();

    let today = Local::now().date_naive();
    assert_eq!(
        prepared.file_name(),
        format!("masked_topo_{}.nc", today.format("%Y-%m-%d"))
    );
    assert_eq!(
        prepared.layers,
        vec!["dem".to_string(), "mask".to_string(), "veg_height".to_string()]
    );

    // dem cells 1 and 5 are outside the mask
    assert_eq!(
        prepared.ranges.get("dem"),
        Some(&ValueRange { min: 0.0, max: 2400.0 })
    );
    // the mask itself is not masked
    assert_eq!(
        prepared.ranges.get("mask"),
        Some(&ValueRange { min: 0.0, max: 1.0 })
    );
}

#[test]
fn test_rejects_wrong_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snow.tif");
    std::fs::write(&path, b"II*").unwrap();

    let result = NetCdfPreparer::modeled().prepare(&path, &context(temp_dir.path()));
    assert!(matches!(result, Err(GudsError::FormatError { .. })));
}
