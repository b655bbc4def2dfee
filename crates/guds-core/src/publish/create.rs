//! Workspace, store and layer creation

use serde_json::{json, Value};

use super::{ExistsQuery, Publisher};
use crate::error::{GudsError, Result};
use crate::models::{LayerReport, StoreKind, UploadType, ValueRange};
use crate::naming::{canonical_name, derive_title, native_name, published_name};
use crate::ports::Transport;

/// A store to create
#[derive(Debug, Clone)]
pub struct StoreSpec {
    pub basin: String,
    pub name: String,
    pub upload_type: UploadType,
    /// File name inside `basins/<basin>/`
    pub file_name: String,
    pub description: Option<String>,
}

impl StoreSpec {
    pub fn kind(&self) -> Result<StoreKind> {
        self.upload_type.store_kind().ok_or_else(|| {
            GudsError::InvalidInput(format!("{} uploads have no store", self.upload_type))
        })
    }
}

/// JSON body creating the store
pub fn store_payload(spec: &StoreSpec) -> Result<Value> {
    let store_type = spec.upload_type.store_type().ok_or_else(|| {
        GudsError::InvalidInput(format!("{} uploads have no store", spec.upload_type))
    })?;

    match spec.kind()? {
        StoreKind::Coverage => {
            let mut store = json!({
                "name": spec.name,
                "type": store_type,
                "enabled": true,
                "_default": false,
                "workspace": {"name": spec.basin},
                "configure": "all",
                "url": format!("file:basins/{}/{}", spec.basin, spec.file_name),
            });
            if let Some(description) = &spec.description {
                store["description"] = json!(description);
            }
            Ok(json!({ "coverageStore": store }))
        }
        StoreKind::Data => {
            let stem = spec.file_name.split('.').next().unwrap_or_default();
            let mut store = json!({
                "name": spec.name,
                "type": store_type,
                "enabled": true,
                "workspace": {"name": spec.basin},
                "connectionParameters": {"entry": [
                    {"@key": "url", "$": format!("file:basins/{}/{}/{}", spec.basin, stem, spec.file_name)},
                    {"@key": "filetype", "$": "shapefile"},
                    {"@key": "create spatial index", "$": "true"},
                ]},
            });
            if let Some(description) = &spec.description {
                store["description"] = json!(description);
            }
            Ok(json!({ "dataStore": store }))
        }
    }
}

/// Names and title of the layer published for one variable
///
/// The date suffix is only added when `dated` is set.
pub fn plan_layer(
    basin: &str,
    date: &str,
    variable: &str,
    range: Option<ValueRange>,
    dated: bool,
) -> LayerReport {
    let native = native_name(variable);
    let canonical = canonical_name(&native);
    let title = derive_title(basin, date, &canonical);
    let name = if dated && !date.is_empty() {
        published_name(&canonical, date)
    } else {
        canonical
    };

    LayerReport {
        name,
        native_name: native,
        title,
        range,
        styles: Vec::new(),
    }
}

/// JSON body creating a coverage
pub fn coverage_payload(basin: &str, store: &str, layer: &LayerReport) -> Value {
    let mut coverage = json!({
        "name": layer.name,
        "nativeName": layer.native_name,
        "nativeCoverageName": layer.native_name,
        "store": {"name": format!("{}:{}", basin, store)},
        "enabled": true,
        "title": layer.title,
    });

    if let Some(range) = layer.range {
        coverage["dimensions"] = json!({"coverageDimension": [{
            "name": layer.name,
            "range": {"min": range.min.to_string(), "max": range.max.to_string()},
        }]});
    }

    json!({ "coverage": coverage })
}

/// JSON body creating a feature type
pub fn feature_type_payload(layer: &LayerReport) -> Value {
    json!({"featureType": {
        "name": layer.name,
        "nativeName": layer.native_name,
        "title": layer.title,
        "enabled": true,
    }})
}

impl<T: Transport> Publisher<T> {
    /// Create a new basin (workspace)
    pub async fn create_basin(&self, basin: &str) -> Result<()> {
        let question = format!(
            "You are about to create a new basin on the geoserver called: {}\nAre you sure you want to continue?",
            basin
        );
        self.require_create(&question, &format!("basin {}", basin))?;

        tracing::info!("Creating new basin {} on geoserver...", basin);
        let payload = json!({"workspace": {"name": basin, "enabled": true}});
        self.transport.post("workspaces", &payload).await
    }

    /// Create a store, replacing an existing one when the policy allows
    ///
    /// Returns `true` when an existing store was replaced.
    pub async fn create_store(&self, spec: &StoreSpec) -> Result<bool> {
        let kind = spec.kind()?;
        let replaced = if self
            .exists(&ExistsQuery::basin(&spec.basin).store(kind, &spec.name))
            .await?
        {
            tracing::warn!("Store {} exists!", spec.name);
            let question = format!("Do you want to overwrite store {}?", spec.name);
            if !self.allow_overwrite(&question)? {
                tracing::info!("Unable to continue without replacing {}", spec.name);
                return Err(GudsError::Aborted(format!(
                    "store {} exists and was not replaced",
                    spec.name
                )));
            }
            self.delete_store(&spec.basin, kind, &spec.name).await?;
            true
        } else {
            false
        };

        let question = format!(
            "You are about to create a new geoserver store called: {} in the {}\nAre you sure you want to continue?",
            spec.name, spec.basin
        );
        self.require_create(&question, &format!("store {}", spec.name))?;

        self.post_store(spec).await?;
        Ok(replaced)
    }

    /// Create a store without asking, deleting any prior one
    pub async fn replace_store(&self, spec: &StoreSpec) -> Result<()> {
        let kind = spec.kind()?;
        if self
            .exists(&ExistsQuery::basin(&spec.basin).store(kind, &spec.name))
            .await?
        {
            tracing::info!("Replacing store {}...", spec.name);
            self.delete_store(&spec.basin, kind, &spec.name).await?;
        }
        self.post_store(spec).await
    }

    async fn delete_store(&self, basin: &str, kind: StoreKind, store: &str) -> Result<()> {
        let resource = format!("workspaces/{}/{}/{}.json", basin, kind.collection(), store);
        self.transport.delete(&resource, &[("recurse", "true")]).await
    }

    async fn post_store(&self, spec: &StoreSpec) -> Result<()> {
        let kind = spec.kind()?;
        let payload = store_payload(spec)?;
        tracing::info!("Creating store {} on geoserver...", spec.name);
        tracing::debug!("Payload: {}", payload);
        let resource = format!("workspaces/{}/{}.json", spec.basin, kind.collection());
        self.transport.post(&resource, &payload).await
    }

    /// Create a coverage or feature type inside a store
    pub async fn create_layer(
        &self,
        basin: &str,
        kind: StoreKind,
        store: &str,
        layer: &LayerReport,
    ) -> Result<()> {
        let payload = match kind {
            StoreKind::Coverage => {
                if let Some(range) = layer.range {
                    tracing::info!("Setting range for {} to [{}, {}]...", layer.native_name, range.min, range.max);
                }
                coverage_payload(basin, store, layer)
            }
            StoreKind::Data => feature_type_payload(layer),
        };

        tracing::debug!("Payload: {}", payload);
        let resource = format!(
            "workspaces/{}/{}/{}/{}.json",
            basin,
            kind.collection(),
            store,
            kind.layer_collection()
        );
        self.transport.post(&resource, &payload).await
    }
}
