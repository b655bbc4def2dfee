//! Upload pipeline
//!
//! validate -> ensure basin -> prepare -> place file -> store -> layers ->
//! styles -> latest aliases -> cleanup. Nothing is rolled back on failure.

use chrono::Local;
use std::path::Path;
use std::time::Instant;

use super::{plan_layer, ExistsQuery, Publisher, StoreSpec};
use crate::error::{GudsError, Result};
use crate::formats::{preparer_for, PrepareContext};
use crate::models::{LayerReport, PreparedFile, UploadReport, UploadRequest, UploadType};
use crate::naming::{latest_name, store_name};
use crate::ports::Transport;

/// Store description shown in the GeoServer UI
fn describe_store(upload_type: UploadType, basin: &str, date: &str) -> Option<String> {
    let today = Local::now().date_naive().format("%Y-%m-%d");
    match upload_type {
        UploadType::Topo => Some(format!(
            "NetCDF file containing topographic images required for modeling the {} watershed in AWSM.\nUploaded: {}",
            basin, date
        )),
        UploadType::Modeled => Some(format!(
            "NetCDF file containing modeled snowpack images from the {} watershed produced by AWSM.\nModel Date: {}\nDate Uploaded: {}",
            basin, date, today
        )),
        UploadType::Flight => Some(format!(
            "Lidar flight of the {} watershed.\nFlight Date: {}\nDate Uploaded: {}",
            basin, date, today
        )),
        _ => None,
    }
}

/// Directory under the data root that receives the prepared file
fn remote_dir(basin: &str, upload_type: UploadType, prepared: &PreparedFile) -> String {
    match upload_type {
        UploadType::Shapefile => format!("basins/{}/{}", basin, prepared.stem()),
        _ => format!("basins/{}", basin),
    }
}

/// Layers the `latest_*` store mirrors
///
/// Skipped layers already exist under their published name, so they are
/// aliased too. Each alias name appears once.
fn latest_aliases(created: &[LayerReport], skipped: &[LayerReport]) -> Vec<LayerReport> {
    let mut aliases: Vec<LayerReport> = Vec::new();
    for layer in created.iter().chain(skipped) {
        let name = latest_name(&layer.name);
        if aliases.iter().any(|a| a.name == name) {
            continue;
        }
        aliases.push(LayerReport {
            name,
            styles: Vec::new(),
            ..layer.clone()
        });
    }
    aliases
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

impl<T: Transport> Publisher<T> {
    /// Publish one local file into a basin
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadReport> {
        let start = Instant::now();
        let result = self.run_upload(request, start).await;

        if request.upload_type.is_netcdf() && self.options.cleanup {
            let scratch = &self.options.scratch_dir;
            if scratch.exists() {
                tracing::info!("Cleaning up files... Removing {}", scratch.display());
                if let Err(e) = tokio::fs::remove_dir_all(scratch).await {
                    tracing::warn!("Could not remove {}: {}", scratch.display(), e);
                }
            }
        }

        let report = result?;
        tracing::info!("Upload took: {:.1}s", report.elapsed_secs);
        tracing::info!("Complete!");
        Ok(report)
    }

    fn validate_request(&self, request: &UploadRequest) -> Result<String> {
        if request.upload_type == UploadType::Styles {
            return Err(GudsError::InvalidInput(
                "styles are submitted with submit_styles, not uploaded".to_string(),
            ));
        }

        let basin = request.basin.trim().to_lowercase();
        if basin.is_empty() {
            tracing::error!("No basin given for the upload.");
            return Err(GudsError::InvalidInput("a basin is required to upload".to_string()));
        }

        if !request.file.is_file() {
            tracing::error!("Upload file doesn't exist.");
            return Err(GudsError::FileNotFound {
                path: request.file.clone(),
            });
        }

        if let Some(mask) = &request.mask {
            if !mask.is_file() {
                tracing::error!("Mask file doesn't exist.");
                return Err(GudsError::FileNotFound { path: mask.clone() });
            }
        }

        Ok(basin)
    }

    async fn run_upload(&self, request: &UploadRequest, start: Instant) -> Result<UploadReport> {
        tracing::info!("Associated Basin: {}", request.basin);
        tracing::info!("Data Upload Type: {}", request.upload_type);
        tracing::info!("Source Filename: {}", request.file.display());
        if let Some(mask) = &request.mask {
            tracing::info!("Mask Filename: {}", mask.display());
        }

        let basin = self.validate_request(request)?;
        let upload_type = request.upload_type;

        let created_basin = if self.exists(&ExistsQuery::basin(&basin)).await? {
            false
        } else {
            self.create_basin(&basin).await?;
            true
        };

        let preparer = preparer_for(upload_type)?;
        let ctx = PrepareContext {
            scratch_dir: &self.options.scratch_dir,
            epsg: request.epsg,
            mask: request.mask.as_deref(),
        };
        let prepared = preparer.prepare(&request.file, &ctx)?;

        let remote_path = self.place_files(&basin, upload_type, &prepared).await?;

        let kind = upload_type
            .store_kind()
            .ok_or_else(|| GudsError::InvalidInput(format!("{} uploads have no store", upload_type)))?;
        let date = prepared.date_label();
        let spec = StoreSpec {
            basin: basin.clone(),
            name: store_name(&basin, upload_type, &prepared.stem()),
            upload_type,
            file_name: prepared.file_name(),
            description: describe_store(upload_type, &basin, &date),
        };
        self.create_store(&spec).await?;

        let mut layers = Vec::new();
        let mut skipped_layers = Vec::new();
        for variable in &prepared.layers {
            let mut layer = plan_layer(
                &basin,
                &date,
                variable,
                prepared.ranges.get(variable).copied(),
                upload_type.is_netcdf(),
            );

            let query = ExistsQuery::basin(&basin).store(kind, &spec.name).layer(&layer.name);
            if self.exists(&query).await? {
                tracing::info!("Layer {} from store {} in the {} exists...", layer.name, spec.name, basin);
                tracing::warn!("Skipping layer {} to geoserver.", layer.name);
                skipped_layers.push(layer);
                continue;
            }

            tracing::info!("Adding {} from {} to the {}", layer.name, spec.name, basin);
            self.create_layer(&basin, kind, &spec.name, &layer).await?;
            layer.styles = self.assign_styles(&basin, &layer.name, prepared.category).await?;
            layers.push(layer);
        }

        let (latest_store, latest_layers) = if request.latest {
            let aliases = latest_aliases(&layers, &skipped_layers);
            self.publish_latest(&spec, &prepared, aliases).await?
        } else {
            (None, Vec::new())
        };

        Ok(UploadReport {
            basin,
            upload_type,
            store: spec.name,
            remote_path,
            created_basin,
            layers,
            skipped_layers: skipped_layers.into_iter().map(|l| l.name).collect(),
            latest_store,
            latest_layers,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// PUT the prepared file and its companions into the resource tree
    ///
    /// Returns the remote path of the main file relative to the data root.
    async fn place_files(
        &self,
        basin: &str,
        upload_type: UploadType,
        prepared: &PreparedFile,
    ) -> Result<String> {
        let dir = remote_dir(basin, upload_type, prepared);
        tracing::info!("Copying local data to remote, this may take a couple minutes...");

        let main = format!("{}/{}", dir, prepared.file_name());
        let body = tokio::fs::read(&prepared.path).await?;
        tracing::debug!("Placing {} ({} bytes) at {}", prepared.path.display(), body.len(), main);
        self.transport
            .put_body(&format!("resource/{}", main), body, upload_type.content_type())
            .await?;

        for companion in &prepared.companions {
            let target = format!("resource/{}/{}", dir, file_name(companion));
            let body = tokio::fs::read(companion).await?;
            tracing::debug!("Placing {} at {}", companion.display(), target);
            self.transport
                .put_body(&target, body, "application/octet-stream")
                .await?;
        }

        Ok(main)
    }

    /// `latest_*` store and layers over the same remote file
    async fn publish_latest(
        &self,
        spec: &StoreSpec,
        prepared: &PreparedFile,
        aliases: Vec<LayerReport>,
    ) -> Result<(Option<String>, Vec<String>)> {
        let kind = spec.kind()?;
        let latest = StoreSpec {
            name: latest_name(&spec.name),
            ..spec.clone()
        };
        tracing::info!("Publishing {} as {}...", spec.name, latest.name);
        self.replace_store(&latest).await?;

        let mut names = Vec::new();
        for alias in aliases {
            self.create_layer(&spec.basin, kind, &latest.name, &alias).await?;
            self.assign_styles(&spec.basin, &alias.name, prepared.category).await?;
            names.push(alias.name);
        }

        Ok((Some(latest.name), names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StyleCategory;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn prepared(path: &str) -> PreparedFile {
        PreparedFile {
            path: PathBuf::from(path),
            companions: Vec::new(),
            date: None,
            layers: vec!["stations".to_string()],
            ranges: BTreeMap::new(),
            category: StyleCategory::Point,
        }
    }

    #[test]
    fn test_remote_dir() {
        let shp = prepared("/data/stations.shp");
        assert_eq!(remote_dir("kings", UploadType::Shapefile, &shp), "basins/kings/stations");
        let nc = prepared("tmp/snow_20190418.nc");
        assert_eq!(remote_dir("kings", UploadType::Modeled, &nc), "basins/kings");
    }

    #[test]
    fn test_describe_store() {
        let topo = describe_store(UploadType::Topo, "kings", "2019-10-01").unwrap();
        assert!(topo.starts_with("NetCDF file containing topographic images"));
        assert!(topo.ends_with("Uploaded: 2019-10-01"));

        let modeled = describe_store(UploadType::Modeled, "kings", "2019-04-18").unwrap();
        assert!(modeled.contains("Model Date: 2019-04-18\nDate Uploaded: "));

        assert!(describe_store(UploadType::Png, "kings", "").is_none());
    }

    fn layer(name: &str, styles: &[&str]) -> LayerReport {
        LayerReport {
            name: name.to_string(),
            native_name: name.to_string(),
            title: name.to_string(),
            range: None,
            styles: styles.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_latest_aliases_include_skipped() {
        let created = vec![layer("swe_20190418", &["swe"])];
        let skipped = vec![
            layer("depth_20190418", &[]),
            layer("swe_20190418", &[]),
        ];
        let aliases = latest_aliases(&created, &skipped);
        let names: Vec<_> = aliases.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["latest_swe", "latest_depth"]);
        assert!(aliases.iter().all(|a| a.styles.is_empty()));
        assert_eq!(aliases[1].native_name, "depth_20190418");
    }
}
