//! EPSG lookups for projection injection

use proj::Proj;

use crate::error::{GudsError, Result};

/// Projection metadata written into a netCDF `projection` variable
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInfo {
    pub epsg: u32,
    /// PROJ definition of the EPSG code
    pub definition: String,
}

impl ProjectionInfo {
    /// `EPSG:<code>` label
    pub fn label(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

/// Look up an EPSG code in the PROJ database
pub fn lookup_epsg(epsg: u32) -> Result<ProjectionInfo> {
    let code = format!("EPSG:{}", epsg);
    let proj = Proj::new(&code).map_err(|e| GudsError::ConfigInvalid {
        key: "epsg".to_string(),
        reason: format!("{} is not a known projection: {}", code, e),
    })?;

    // CRS objects built from an authority code may not export a definition
    let definition = match proj.def() {
        Ok(def) if !def.trim().is_empty() => def.trim().to_string(),
        Ok(_) => code,
        Err(e) => {
            tracing::debug!("PROJ has no definition for {}: {}", code, e);
            code
        }
    };

    Ok(ProjectionInfo { epsg, definition })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let info = ProjectionInfo {
            epsg: 32611,
            definition: "proj=utm zone=11 datum=WGS84".to_string(),
        };
        assert_eq!(info.label(), "EPSG:32611");
    }

    #[test]
    fn test_lookup_utm() {
        let info = lookup_epsg(32611).unwrap();
        assert_eq!(info.epsg, 32611);
        assert!(!info.definition.is_empty());
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup_epsg(1).is_err());
    }
}
