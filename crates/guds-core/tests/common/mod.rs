//! netCDF and shapefile fixtures shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Values of `specific_mass` in the modeled fixture (time=1, y=2, x=3)
pub const SWE_VALUES: [f32; 6] = [0.0, 1.5, f32::NAN, 10.0, 3.0, 812.5];

/// Mask multiplied into the fixtures
pub const MASK_VALUES: [u8; 6] = [1, 0, 1, 1, 1, 0];

fn add_grid(file: &mut netcdf::FileMut) {
    file.add_dimension("y", 2).unwrap();
    file.add_dimension("x", 3).unwrap();

    let mut x = file.add_variable::<f64>("x", &["x"]).unwrap();
    x.put_attribute("units", "meters").unwrap();
    x.put_values(&[320000.0f64, 320050.0, 320100.0], ..).unwrap();

    let mut y = file.add_variable::<f64>("y", &["y"]).unwrap();
    y.put_attribute("units", "meters").unwrap();
    y.put_values(&[4100000.0f64, 4099950.0], ..).unwrap();
}

fn add_projection(file: &mut netcdf::FileMut) {
    let mut projection = file.add_variable::<i32>("projection", &[]).unwrap();
    projection.put_attribute("epsg_code", "EPSG:32611").unwrap();
    projection.put_values(&[0i32], ..).unwrap();
}

/// Model output dated 2019-04-18 with one variable outside the keep list
pub fn write_modeled(dir: &Path, name: &str, with_projection: bool) -> PathBuf {
    let path = dir.join(name);
    let mut file = netcdf::create(&path).unwrap();
    file.add_attribute("source", "isnobal").unwrap();
    file.add_dimension("time", 1).unwrap();
    add_grid(&mut file);
    if with_projection {
        add_projection(&mut file);
    }

    let mut time = file.add_variable::<f64>("time", &["time"]).unwrap();
    time.put_attribute("units", "hours since 2019-04-18 00:00:00").unwrap();
    time.put_attribute("calendar", "standard").unwrap();
    time.put_values(&[23.0f64], ..).unwrap();

    let mut swe = file
        .add_variable::<f32>("specific_mass", &["time", "y", "x"])
        .unwrap();
    swe.put_attribute("units", "kg/m^2").unwrap();
    swe.put_values(&SWE_VALUES, ..).unwrap();

    let mut depth = file
        .add_variable::<f32>("thickness", &["time", "y", "x"])
        .unwrap();
    depth.put_attribute("_FillValue", -9999.0f32).unwrap();
    depth
        .put_values(&[-9999.0f32, 0.5, 0.75, 1.0, 1.25, 2.5], ..)
        .unwrap();

    let mut lwc = file
        .add_variable::<f32>("liquid_water", &["time", "y", "x"])
        .unwrap();
    lwc.put_values(&[0.0f32; 6], ..).unwrap();

    path
}

/// Static topo image with its own mask
pub fn write_topo(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = netcdf::create(&path).unwrap();
    add_grid(&mut file);
    add_projection(&mut file);

    let mut dem = file.add_variable::<f64>("dem", &["y", "x"]).unwrap();
    dem.put_values(&[2000.0f64, 2100.0, 2200.0, 2300.0, 2400.0, 3900.0], ..)
        .unwrap();

    let mut mask = file.add_variable::<u8>("mask", &["y", "x"]).unwrap();
    mask.put_values(&MASK_VALUES, ..).unwrap();

    let mut veg = file.add_variable::<i16>("veg_height", &["y", "x"]).unwrap();
    veg.put_values(&[5i16, 10, 15, 20, 25, 30], ..).unwrap();

    path
}

/// A standalone mask file
pub fn write_mask(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = netcdf::create(&path).unwrap();
    add_grid(&mut file);
    let mut mask = file.add_variable::<u8>("mask", &["y", "x"]).unwrap();
    mask.put_values(&MASK_VALUES, ..).unwrap();
    path
}

/// Read an f32 variable back
pub fn read_f32(path: &Path, name: &str) -> Vec<f32> {
    let file = netcdf::open(path).unwrap();
    let var = file.variable(name).unwrap();
    var.get_values::<f32, _>(..).unwrap()
}

/// Read an f64 variable back
pub fn read_f64(path: &Path, name: &str) -> Vec<f64> {
    let file = netcdf::open(path).unwrap();
    let var = file.variable(name).unwrap();
    var.get_values::<f64, _>(..).unwrap()
}

/// Read a string attribute of a variable
pub fn str_attr(path: &Path, var: &str, attr: &str) -> Option<String> {
    let file = netcdf::open(path).unwrap();
    let var = file.variable(var)?;
    match var.attribute_value(attr)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Variable names of a file, in order
pub fn variable_names(path: &Path) -> Vec<String> {
    let file = netcdf::open(path).unwrap();
    file.variables().map(|v| v.name().to_string()).collect()
}

/// Point shapefile `stations` with .prj and .cpg companions
pub fn write_stations(dir: &Path) -> PathBuf {
    use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
    use shapefile::{Point, Writer};

    let path = dir.join("stations.shp");
    {
        let table = TableWriterBuilder::new().add_character_field("name".try_into().unwrap(), 20);
        let mut writer = Writer::from_path(&path, table).unwrap();
        let mut record = Record::default();
        record.insert(
            "name".to_string(),
            FieldValue::Character(Some("Giant Forest".to_string())),
        );
        writer
            .write_shape_and_record(&Point::new(-118.77, 36.56), &record)
            .unwrap();
    }
    std::fs::write(
        dir.join("stations.prj"),
        r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#,
    )
    .unwrap();
    std::fs::write(dir.join("stations.cpg"), "UTF-8").unwrap();
    path
}
