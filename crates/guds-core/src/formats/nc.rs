//! netCDF preparation
//!
//! Copies the variables worth publishing into a scratch file, optionally
//! multiplies a mask into the data, injects a projection variable when the
//! file has none, and records the value range of every data variable.

use chrono::{Local, NaiveDate};
use netcdf::types::{FloatType, IntType, NcTypeDescriptor, NcVariableType};
use netcdf::{AttributeValue, Variable, VariableMut};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{GudsError, Result};
use crate::formats::cf_time::decode_time;
use crate::formats::projection::{lookup_epsg, ProjectionInfo};
use crate::formats::validation::FormatValidator;
use crate::formats::{FilePreparer, PrepareContext};
use crate::models::{PreparedFile, StyleCategory, ValueRange};

/// Variables that are never published as layers
pub const COORDINATE_VARIABLES: &[&str] = &["x", "y", "time", "projection"];

/// Variables kept from modeled snowpack output
pub const MODELED_VARIABLES: &[&str] = &[
    "x",
    "y",
    "time",
    "projection",
    "snow_density",
    "specific_mass",
    "thickness",
    "cold_content",
];

/// Name of the mask variable
pub const MASK_VARIABLE: &str = "mask";

const FORMAT: &str = "NetCDF";

/// Flavour of netCDF upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetCdfKind {
    /// Dated model output, subset to the snowpack variables
    Modeled,
    /// Static topographic images, all variables kept
    Topo,
}

impl NetCdfKind {
    /// Whether a source variable is copied
    pub fn keeps(&self, name: &str) -> bool {
        match self {
            NetCdfKind::Modeled => MODELED_VARIABLES.contains(&name),
            NetCdfKind::Topo => true,
        }
    }

    /// Variables the mask is never applied to
    fn mask_exclusions(&self) -> &'static [&'static str] {
        match self {
            NetCdfKind::Modeled => &[],
            NetCdfKind::Topo => &[MASK_VARIABLE],
        }
    }
}

/// Whether a variable becomes a layer
pub fn is_layer(name: &str) -> bool {
    !COORDINATE_VARIABLES.contains(&name)
}

/// netCDF preparer
pub struct NetCdfPreparer {
    kind: NetCdfKind,
}

impl NetCdfPreparer {
    pub fn modeled() -> Self {
        Self {
            kind: NetCdfKind::Modeled,
        }
    }

    pub fn topo() -> Self {
        Self {
            kind: NetCdfKind::Topo,
        }
    }

    pub fn kind(&self) -> NetCdfKind {
        self.kind
    }
}

impl FilePreparer for NetCdfPreparer {
    fn prepare(&self, path: &Path, ctx: &PrepareContext<'_>) -> Result<PreparedFile> {
        FormatValidator::validation_to_result(&self.validate(path), FORMAT)?;

        let source = netcdf::open(path)?;
        let stem = file_stem(path);

        let (date, out_name) = match self.kind {
            NetCdfKind::Modeled => {
                tracing::info!("Retrieving date from netcdf...");
                let date = read_model_date(&source)?;
                (date, format!("{}_{}.nc", stem, date.format("%Y%m%d")))
            }
            NetCdfKind::Topo => {
                let today = Local::now().date_naive();
                (today, format!("{}_{}.nc", stem, today.format("%Y-%m-%d")))
            }
        };

        let keep: Vec<String> = source
            .variables()
            .map(|v| v.name().to_string())
            .filter(|name| self.kind.keeps(name))
            .collect();

        let layers: Vec<String> = keep.iter().filter(|n| is_layer(n)).cloned().collect();
        if layers.is_empty() {
            tracing::error!("No variables found in netcdf {}", path.display());
            return Err(GudsError::NoVariables {
                path: path.to_path_buf(),
            });
        }

        let projection = if keep.iter().any(|n| n == "projection") {
            None
        } else {
            tracing::info!("Netcdf is missing projection information...");
            match ctx.epsg {
                Some(code) => Some(lookup_epsg(code)?),
                None => {
                    return Err(GudsError::MissingProjection {
                        path: path.to_path_buf(),
                    })
                }
            }
        };

        let mask = match ctx.mask {
            Some(mask_path) => {
                tracing::info!("Masking netcdf using {}...", mask_path.display());
                let mask_file = netcdf::open(mask_path)?;
                Some(read_mask(&mask_file, mask_path)?)
            }
            None if self.kind == NetCdfKind::Topo && source.variable(MASK_VARIABLE).is_some() => {
                tracing::info!("Masking netcdf using its own {} variable...", MASK_VARIABLE);
                Some(read_mask(&source, path)?)
            }
            None => None,
        };

        let out_name = if mask.is_some() {
            format!("masked_{}", out_name)
        } else {
            out_name
        };

        fs::create_dir_all(ctx.scratch_dir)?;
        let out_path = ctx.scratch_dir.join(&out_name);
        if out_path.exists() {
            fs::remove_file(&out_path)?;
        }

        tracing::info!("Copying netcdf to {}...", out_path.display());
        let ranges = write_subset(
            &source,
            &out_path,
            &keep,
            mask.as_ref(),
            self.kind.mask_exclusions(),
            projection.as_ref(),
        )?;

        Ok(PreparedFile {
            path: out_path,
            companions: Vec::new(),
            date: Some(date),
            layers,
            ranges,
            category: StyleCategory::Raster,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["nc"]
    }

    fn format_name(&self) -> &str {
        FORMAT
    }
}

fn file_stem(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or("data")
        .to_string()
}

/// A 2-D mask broadcast over the trailing y/x dimensions
#[derive(Debug, Clone)]
pub struct Mask {
    pub values: Vec<f64>,
    pub shape: (usize, usize),
}

impl Mask {
    fn plane(&self) -> usize {
        self.shape.0 * self.shape.1
    }

    /// Whether a variable of this shape can be masked
    pub fn fits(&self, dims: &[usize]) -> bool {
        dims.len() >= 2 && (dims[dims.len() - 2], dims[dims.len() - 1]) == self.shape
    }
}

/// Multiply the mask into every plane of `values`, leaving fill cells alone
pub fn apply_mask(values: &mut [f64], mask: &Mask, fill: Option<f64>) {
    let plane = mask.plane();
    if plane == 0 {
        return;
    }
    for (i, v) in values.iter_mut().enumerate() {
        if fill.is_some_and(|f| *v == f) {
            continue;
        }
        *v *= mask.values[i % plane];
    }
}

fn read_mask(file: &netcdf::File, path: &Path) -> Result<Mask> {
    let var = file.variable(MASK_VARIABLE).ok_or_else(|| {
        GudsError::format(FORMAT, format!("{} has no '{}' variable", path.display(), MASK_VARIABLE))
    })?;

    let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if dims.len() < 2 {
        return Err(GudsError::format(
            FORMAT,
            format!("mask in {} must have y and x dimensions", path.display()),
        ));
    }
    let shape = (dims[dims.len() - 2], dims[dims.len() - 1]);

    let mut values = read_samples(&var)?.ok_or_else(|| {
        GudsError::format(FORMAT, format!("mask in {} is not numeric", path.display()))
    })?;
    values.truncate(shape.0 * shape.1);

    Ok(Mask { values, shape })
}

/// Date of the first time step of model output
pub fn read_model_date(file: &netcdf::File) -> Result<NaiveDate> {
    let time = file
        .variable("time")
        .ok_or_else(|| GudsError::format(FORMAT, "modeled output has no 'time' variable"))?;

    let units = get_str_attr(&time, "units")
        .ok_or_else(|| GudsError::format(FORMAT, "'time' has no units attribute"))?;
    let calendar = get_str_attr(&time, "calendar");

    let first = read_samples(&time)?
        .and_then(|values| values.first().copied())
        .ok_or_else(|| GudsError::format(FORMAT, "'time' holds no values"))?;

    Ok(decode_time(first, &units, calendar.as_deref())?.date())
}

/// Copy `keep` into a new file and return the value range of each layer
fn write_subset(
    source: &netcdf::File,
    out_path: &Path,
    keep: &[String],
    mask: Option<&Mask>,
    mask_exclusions: &[&str],
    projection: Option<&ProjectionInfo>,
) -> Result<BTreeMap<String, ValueRange>> {
    let mut target = netcdf::create(out_path)?;

    for dim in source.dimensions() {
        target.add_dimension(&dim.name().to_string(), dim.len())?;
    }
    for attr in source.attributes() {
        target.add_attribute(&attr.name().to_string(), attr.value()?)?;
    }

    if let Some(info) = projection {
        tracing::info!("Adding projection information using {}...", info.label());
        let mut var = target.add_variable::<i32>("projection", &[])?;
        var.put_attribute("epsg_code", info.label())?;
        var.put_attribute("spatial_ref", info.definition.clone())?;
        var.put_attribute("long_name", "projection")?;
        var.put_values(&[0i32], ..)?;
    }

    // Attributes go in before any data so `_FillValue` is accepted
    for name in keep {
        let var = source
            .variable(name)
            .ok_or_else(|| GudsError::format(FORMAT, format!("variable '{}' vanished", name)))?;
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();
        let dim_refs: Vec<&str> = dims.iter().map(String::as_str).collect();

        let mut out = target.add_variable_with_type(name, &dim_refs, &var.vartype())?;
        for attr in var.attributes() {
            out.put_attribute(&attr.name().to_string(), attr.value()?)?;
        }
        if projection.is_some() && is_layer(name) && dims.len() >= 2 {
            out.put_attribute("grid_mapping", "projection")?;
        }
    }

    let mut ranges = BTreeMap::new();
    for name in keep {
        let var = source
            .variable(name)
            .ok_or_else(|| GudsError::format(FORMAT, format!("variable '{}' vanished", name)))?;

        let mut values = match read_samples(&var)? {
            Some(values) if !values.is_empty() => values,
            Some(_) => continue,
            None => {
                tracing::debug!("Skipping data of non-numeric variable {}", name);
                continue;
            }
        };

        let fill = get_f64_attr(&var, "_FillValue").or_else(|| get_f64_attr(&var, "missing_value"));
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        if let Some(mask) = mask {
            if is_layer(name) && !mask_exclusions.contains(&name.as_str()) {
                if mask.fits(&shape) {
                    apply_mask(&mut values, mask, fill);
                } else {
                    tracing::warn!("Not masking {}: shape {:?} does not match mask", name, shape);
                }
            }
        }

        if is_layer(name) {
            match ValueRange::from_values(&values, fill) {
                Some(range) => {
                    tracing::debug!("Range of {}: [{}, {}]", name, range.min, range.max);
                    ranges.insert(name.clone(), range);
                }
                None => tracing::warn!("{} holds no finite values, no range recorded", name),
            }
        }

        let mut out = target
            .variable_mut(name)
            .ok_or_else(|| GudsError::format(FORMAT, format!("variable '{}' was not created", name)))?;
        write_samples(&mut out, &var.vartype(), &values)?;
    }

    Ok(ranges)
}

/// Numeric netCDF element types, widened to f64 for processing
trait Sample: NcTypeDescriptor + Copy {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(
            impl Sample for $t {
                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn from_f64(value: f64) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_sample!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

fn read_as<T: Sample>(var: &Variable<'_>) -> Result<Vec<f64>> {
    let raw: Vec<T> = var.get_values(..)?;
    Ok(raw.into_iter().map(Sample::to_f64).collect())
}

fn write_as<T: Sample>(var: &mut VariableMut<'_>, values: &[f64]) -> Result<()> {
    let raw: Vec<T> = values.iter().map(|&v| T::from_f64(v)).collect();
    var.put_values(&raw, ..)?;
    Ok(())
}

/// Read a numeric variable as f64, `None` for non-numeric types
fn read_samples(var: &Variable<'_>) -> Result<Option<Vec<f64>>> {
    let values = match var.vartype() {
        NcVariableType::Float(FloatType::F32) => read_as::<f32>(var)?,
        NcVariableType::Float(FloatType::F64) => read_as::<f64>(var)?,
        NcVariableType::Int(IntType::I8) => read_as::<i8>(var)?,
        NcVariableType::Int(IntType::U8) => read_as::<u8>(var)?,
        NcVariableType::Int(IntType::I16) => read_as::<i16>(var)?,
        NcVariableType::Int(IntType::U16) => read_as::<u16>(var)?,
        NcVariableType::Int(IntType::I32) => read_as::<i32>(var)?,
        NcVariableType::Int(IntType::U32) => read_as::<u32>(var)?,
        NcVariableType::Int(IntType::I64) => read_as::<i64>(var)?,
        NcVariableType::Int(IntType::U64) => read_as::<u64>(var)?,
        _ => return Ok(None),
    };
    Ok(Some(values))
}

fn write_samples(var: &mut VariableMut<'_>, vartype: &NcVariableType, values: &[f64]) -> Result<()> {
    match vartype {
        NcVariableType::Float(FloatType::F32) => write_as::<f32>(var, values),
        NcVariableType::Float(FloatType::F64) => write_as::<f64>(var, values),
        NcVariableType::Int(IntType::I8) => write_as::<i8>(var, values),
        NcVariableType::Int(IntType::U8) => write_as::<u8>(var, values),
        NcVariableType::Int(IntType::I16) => write_as::<i16>(var, values),
        NcVariableType::Int(IntType::U16) => write_as::<u16>(var, values),
        NcVariableType::Int(IntType::I32) => write_as::<i32>(var, values),
        NcVariableType::Int(IntType::U32) => write_as::<u32>(var, values),
        NcVariableType::Int(IntType::I64) => write_as::<i64>(var, values),
        NcVariableType::Int(IntType::U64) => write_as::<u64>(var, values),
        _ => Ok(()),
    }
}

/// Check if a variable has an attribute with the given name.
fn has_attr(var: &Variable<'_>, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &Variable<'_>, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_str_attr(var: &Variable<'_>, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
