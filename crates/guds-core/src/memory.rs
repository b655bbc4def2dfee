//! In-memory GeoServer catalog for development and testing.
//!
//! Speaks the same resource paths and JSON shapes as the REST API, so the
//! publisher can run unchanged against it. Unknown resources answer like a
//! 404. The implementation uses `RwLock::unwrap()` intentionally: lock
//! poisoning only occurs when another thread panicked while holding the lock.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::error::{GudsError, Result};
use crate::models::StoreKind;
use crate::ports::Transport;

/// Styles every GeoServer ships with
pub const BUILTIN_STYLES: &[&str] = &["generic", "line", "point", "polygon", "raster"];

/// A request seen by the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedRequest {
    pub method: String,
    pub resource: String,
    pub payload: Option<Value>,
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
struct StoreEntry {
    payload: Value,
    layers: Vec<(String, Value)>,
}

#[derive(Debug, Clone, Default)]
struct WorkspaceEntry {
    coverage_stores: BTreeMap<String, StoreEntry>,
    data_stores: BTreeMap<String, StoreEntry>,
}

impl WorkspaceEntry {
    fn stores(&self, kind: StoreKind) -> &BTreeMap<String, StoreEntry> {
        match kind {
            StoreKind::Coverage => &self.coverage_stores,
            StoreKind::Data => &self.data_stores,
        }
    }

    fn stores_mut(&mut self, kind: StoreKind) -> &mut BTreeMap<String, StoreEntry> {
        match kind {
            StoreKind::Coverage => &mut self.coverage_stores,
            StoreKind::Data => &mut self.data_stores,
        }
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    workspaces: BTreeMap<String, WorkspaceEntry>,
    styles: BTreeMap<String, Option<Vec<u8>>>,
    layer_styles: BTreeMap<String, Vec<String>>,
    resources: BTreeMap<String, Vec<u8>>,
    requests: Vec<RecordedRequest>,
}

/// In-memory implementation of Transport
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl MemoryCatalog {
    /// Create a catalog holding only the built-in styles
    pub fn new() -> Self {
        let catalog = Self::default();
        {
            let mut state = catalog.state.write().unwrap();
            for style in BUILTIN_STYLES {
                state.styles.insert(style.to_string(), None);
            }
        }
        catalog
    }

    /// Seed a workspace
    pub fn with_workspace(self, name: &str) -> Self {
        self.state
            .write()
            .unwrap()
            .workspaces
            .entry(name.to_string())
            .or_default();
        self
    }

    /// Seed a store with layers
    pub fn with_store(self, workspace: &str, kind: StoreKind, store: &str, layers: &[&str]) -> Self {
        {
            let mut state = self.state.write().unwrap();
            let entry = state
                .workspaces
                .entry(workspace.to_string())
                .or_default()
                .stores_mut(kind)
                .entry(store.to_string())
                .or_default();
            for layer in layers {
                entry.layers.push((layer.to_string(), json!({"name": layer})));
            }
        }
        self
    }

    /// Seed a style with an optional SLD body
    pub fn with_style(self, name: &str, body: Option<&[u8]>) -> Self {
        self.state
            .write()
            .unwrap()
            .styles
            .insert(name.to_string(), body.map(<[u8]>::to_vec));
        self
    }

    /// Seed a file in the resource tree (path below `resource/`)
    pub fn with_resource(self, path: &str, body: &[u8]) -> Self {
        self.state
            .write()
            .unwrap()
            .resources
            .insert(path.to_string(), body.to_vec());
        self
    }

    /// All requests received, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.read().unwrap().requests.clone()
    }

    /// Requests other than GET
    pub fn writes(&self) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.method != "GET").collect()
    }

    pub fn has_workspace(&self, name: &str) -> bool {
        self.state.read().unwrap().workspaces.contains_key(name)
    }

    pub fn has_store(&self, workspace: &str, kind: StoreKind, store: &str) -> bool {
        self.state
            .read()
            .unwrap()
            .workspaces
            .get(workspace)
            .is_some_and(|ws| ws.stores(kind).contains_key(store))
    }

    /// Store payload as posted
    pub fn store_payload(&self, workspace: &str, kind: StoreKind, store: &str) -> Option<Value> {
        let state = self.state.read().unwrap();
        let entry = state.workspaces.get(workspace)?.stores(kind).get(store)?;
        Some(entry.payload.clone())
    }

    /// Layer names of a store, in creation order
    pub fn layer_names(&self, workspace: &str, kind: StoreKind, store: &str) -> Vec<String> {
        let state = self.state.read().unwrap();
        state
            .workspaces
            .get(workspace)
            .and_then(|ws| ws.stores(kind).get(store))
            .map(|entry| entry.layers.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Layer payload as posted
    pub fn layer_payload(
        &self,
        workspace: &str,
        kind: StoreKind,
        store: &str,
        layer: &str,
    ) -> Option<Value> {
        let state = self.state.read().unwrap();
        let entry = state.workspaces.get(workspace)?.stores(kind).get(store)?;
        entry
            .layers
            .iter()
            .find(|(name, _)| name == layer)
            .map(|(_, payload)| payload.clone())
    }

    pub fn has_style(&self, name: &str) -> bool {
        self.state.read().unwrap().styles.contains_key(name)
    }

    pub fn style_body(&self, name: &str) -> Option<Vec<u8>> {
        self.state.read().unwrap().styles.get(name).cloned().flatten()
    }

    /// Styles attached to `workspace:layer`
    pub fn layer_styles(&self, qualified_layer: &str) -> Vec<String> {
        self.state
            .read()
            .unwrap()
            .layer_styles
            .get(qualified_layer)
            .cloned()
            .unwrap_or_default()
    }

    /// File placed in the resource tree (path below `resource/`)
    pub fn resource(&self, path: &str) -> Option<Vec<u8>> {
        self.state.read().unwrap().resources.get(path).cloned()
    }

    fn record(&self, method: &str, resource: &str, payload: Option<&Value>, params: &[(&str, &str)]) {
        self.state.write().unwrap().requests.push(RecordedRequest {
            method: method.to_string(),
            resource: resource.to_string(),
            payload: payload.cloned(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }
}

/// Split a resource into path segments relative to the REST root
fn segments(resource: &str) -> Vec<String> {
    let relative = match resource.find("/rest/") {
        Some(idx) if resource.contains("://") => &resource[idx + "/rest/".len()..],
        _ => resource,
    };
    let relative = relative.split(['?', '#']).next().unwrap_or_default();

    let mut parts: Vec<String> = relative
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    // Files in the resource tree keep their extension
    if parts.first().map(String::as_str) != Some("resource") {
        if let Some(last) = parts.last_mut() {
            for suffix in [".json", ".xml", ".sld"] {
                if let Some(stripped) = last.strip_suffix(suffix) {
                    *last = stripped.to_string();
                    break;
                }
            }
        }
    }
    parts
}

fn store_kind(collection: &str) -> Option<StoreKind> {
    match collection {
        "coveragestores" => Some(StoreKind::Coverage),
        "datastores" => Some(StoreKind::Data),
        _ => None,
    }
}

fn not_found(resource: &str) -> GudsError {
    GudsError::RemoteNotFound {
        resource: resource.to_string(),
    }
}

fn conflict(resource: &str) -> GudsError {
    GudsError::UnexpectedStatus {
        resource: resource.to_string(),
        status: 409,
    }
}

fn listing<'a>(outer: &str, inner: &str, names: impl Iterator<Item = &'a String>, href: &str) -> Value {
    let items: Vec<Value> = names
        .map(|name| json!({"name": name, "href": format!("{}/{}.json", href, name)}))
        .collect();
    if items.is_empty() {
        json!({ outer: "" })
    } else {
        json!({ outer: { inner: items } })
    }
}

fn payload_name<'a>(payload: &'a Value, key: &str, resource: &str) -> Result<&'a str> {
    payload
        .get(key)
        .and_then(|o| o.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| GudsError::UnexpectedStatus {
            resource: resource.to_string(),
            status: 400,
        })
}

impl MemoryCatalog {
    fn handle_get(&self, resource: &str) -> Result<Value> {
        let parts = segments(resource);
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        let state = self.state.read().unwrap();

        match parts.as_slice() {
            ["workspaces"] => Ok(listing(
                "workspaces",
                "workspace",
                state.workspaces.keys(),
                "workspaces",
            )),
            ["workspaces", ws] => {
                if !state.workspaces.contains_key(*ws) {
                    return Err(not_found(resource));
                }
                Ok(json!({"workspace": {
                    "name": ws,
                    "coverageStores": format!("workspaces/{}/coveragestores.json", ws),
                    "dataStores": format!("workspaces/{}/datastores.json", ws),
                }}))
            }
            ["workspaces", ws, collection] => {
                let kind = store_kind(collection).ok_or_else(|| not_found(resource))?;
                let entry = state.workspaces.get(*ws).ok_or_else(|| not_found(resource))?;
                let (outer, inner) = kind.listing_keys();
                Ok(listing(
                    outer,
                    inner,
                    entry.stores(kind).keys(),
                    &format!("workspaces/{}/{}", ws, collection),
                ))
            }
            ["workspaces", ws, collection, store] => {
                let kind = store_kind(collection).ok_or_else(|| not_found(resource))?;
                let entry = state
                    .workspaces
                    .get(*ws)
                    .and_then(|w| w.stores(kind).get(*store))
                    .ok_or_else(|| not_found(resource))?;
                let (_, inner) = kind.listing_keys();
                Ok(json!({ inner: {
                    "name": store,
                    kind.layer_listing_keys().0: format!(
                        "workspaces/{}/{}/{}/{}.json",
                        ws, collection, store, kind.layer_collection()
                    ),
                    "payload": entry.payload,
                }}))
            }
            ["workspaces", ws, collection, store, layers] => {
                let kind = store_kind(collection).ok_or_else(|| not_found(resource))?;
                if *layers != kind.layer_collection() {
                    return Err(not_found(resource));
                }
                let entry = state
                    .workspaces
                    .get(*ws)
                    .and_then(|w| w.stores(kind).get(*store))
                    .ok_or_else(|| not_found(resource))?;
                let (outer, inner) = kind.layer_listing_keys();
                let names: Vec<String> = entry.layers.iter().map(|(n, _)| n.clone()).collect();
                Ok(listing(
                    outer,
                    inner,
                    names.iter(),
                    &format!("workspaces/{}/{}/{}/{}", ws, collection, store, layers),
                ))
            }
            ["styles"] => Ok(listing("styles", "style", state.styles.keys(), "styles")),
            ["styles", name] => {
                if !state.styles.contains_key(*name) {
                    return Err(not_found(resource));
                }
                Ok(json!({"style": {"name": name, "filename": format!("{}.sld", name)}}))
            }
            ["layers", qualified] => {
                let styles = state.layer_styles.get(*qualified).cloned().unwrap_or_default();
                Ok(json!({"layer": {
                    "name": qualified,
                    "styles": {"style": styles.iter().map(|s| json!({"name": s})).collect::<Vec<_>>()},
                }}))
            }
            _ => Err(not_found(resource)),
        }
    }

    fn handle_post(&self, resource: &str, payload: &Value) -> Result<()> {
        let parts = segments(resource);
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        let mut state = self.state.write().unwrap();

        match parts.as_slice() {
            ["workspaces"] => {
                let name = payload_name(payload, "workspace", resource)?;
                if state.workspaces.contains_key(name) {
                    return Err(conflict(resource));
                }
                state.workspaces.insert(name.to_string(), WorkspaceEntry::default());
                Ok(())
            }
            ["workspaces", ws, collection] => {
                let kind = store_kind(collection).ok_or_else(|| not_found(resource))?;
                let (_, key) = kind.listing_keys();
                let name = payload_name(payload, key, resource)?.to_string();
                let stores = state
                    .workspaces
                    .get_mut(*ws)
                    .ok_or_else(|| not_found(resource))?
                    .stores_mut(kind);
                if stores.contains_key(&name) {
                    return Err(conflict(resource));
                }
                stores.insert(
                    name,
                    StoreEntry {
                        payload: payload.clone(),
                        layers: Vec::new(),
                    },
                );
                Ok(())
            }
            ["workspaces", ws, collection, store, layers] => {
                let kind = store_kind(collection).ok_or_else(|| not_found(resource))?;
                if *layers != kind.layer_collection() {
                    return Err(not_found(resource));
                }
                let (_, key) = kind.layer_listing_keys();
                let name = payload_name(payload, key, resource)?.to_string();
                let entry = state
                    .workspaces
                    .get_mut(*ws)
                    .and_then(|w| w.stores_mut(kind).get_mut(*store))
                    .ok_or_else(|| not_found(resource))?;
                if entry.layers.iter().any(|(n, _)| *n == name) {
                    return Err(conflict(resource));
                }
                entry.layers.push((name, payload.clone()));
                Ok(())
            }
            ["styles"] => {
                let name = payload_name(payload, "style", resource)?;
                if state.styles.contains_key(name) {
                    return Err(conflict(resource));
                }
                state.styles.insert(name.to_string(), None);
                Ok(())
            }
            ["layers", qualified, "styles"] => {
                let name = payload_name(payload, "style", resource)?.to_string();
                if !state.styles.contains_key(&name) {
                    return Err(not_found(resource));
                }
                let styles = state.layer_styles.entry(qualified.to_string()).or_default();
                if !styles.contains(&name) {
                    styles.push(name);
                }
                Ok(())
            }
            _ => Err(not_found(resource)),
        }
    }

    fn handle_put_body(&self, resource: &str, body: Vec<u8>) -> Result<()> {
        let parts = segments(resource);
        let mut state = self.state.write().unwrap();

        match parts.first().map(String::as_str) {
            Some("resource") if parts.len() > 1 => {
                state.resources.insert(parts[1..].join("/"), body);
                Ok(())
            }
            Some("styles") if parts.len() == 2 => match state.styles.get_mut(&parts[1]) {
                Some(slot) => {
                    *slot = Some(body);
                    Ok(())
                }
                None => Err(not_found(resource)),
            },
            _ => Err(not_found(resource)),
        }
    }

    fn handle_delete(&self, resource: &str, params: &[(&str, &str)]) -> Result<()> {
        let parts = segments(resource);
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        let recurse = params
            .iter()
            .any(|(k, v)| *k == "recurse" && v.eq_ignore_ascii_case("true"));
        let mut state = self.state.write().unwrap();

        match parts.as_slice() {
            ["workspaces", ws] => {
                let entry = state.workspaces.get(*ws).ok_or_else(|| not_found(resource))?;
                let empty = entry.coverage_stores.is_empty() && entry.data_stores.is_empty();
                if !empty && !recurse {
                    return Err(GudsError::UnexpectedStatus {
                        resource: resource.to_string(),
                        status: 403,
                    });
                }
                state.workspaces.remove(*ws);
                let prefix = format!("{}:", ws);
                state.layer_styles.retain(|k, _| !k.starts_with(&prefix));
                Ok(())
            }
            ["workspaces", ws, collection, store] => {
                let kind = store_kind(collection).ok_or_else(|| not_found(resource))?;
                let stores = state
                    .workspaces
                    .get_mut(*ws)
                    .ok_or_else(|| not_found(resource))?
                    .stores_mut(kind);
                let entry = stores.get(*store).ok_or_else(|| not_found(resource))?;
                if !entry.layers.is_empty() && !recurse {
                    return Err(GudsError::UnexpectedStatus {
                        resource: resource.to_string(),
                        status: 403,
                    });
                }
                let removed: Vec<String> = entry
                    .layers
                    .iter()
                    .map(|(n, _)| format!("{}:{}", ws, n))
                    .collect();
                stores.remove(*store);
                for layer in removed {
                    state.layer_styles.remove(&layer);
                }
                Ok(())
            }
            ["styles", name] => {
                if state.styles.remove(*name).is_none() {
                    return Err(not_found(resource));
                }
                Ok(())
            }
            _ => Err(not_found(resource)),
        }
    }
}

#[async_trait]
impl Transport for MemoryCatalog {
    async fn get(&self, resource: &str) -> Result<Value> {
        self.record("GET", resource, None, &[]);
        self.handle_get(resource)
    }

    async fn post(&self, resource: &str, payload: &Value) -> Result<()> {
        self.record("POST", resource, Some(payload), &[]);
        self.handle_post(resource, payload)
    }

    async fn put(&self, resource: &str, payload: &Value) -> Result<()> {
        self.record("PUT", resource, Some(payload), &[]);
        // Modifications are accepted for anything that exists
        self.handle_get(resource).map(|_| ())
    }

    async fn put_body(&self, resource: &str, body: Vec<u8>, _content_type: &str) -> Result<()> {
        self.record("PUT", resource, None, &[]);
        self.handle_put_body(resource, body)
    }

    async fn delete(&self, resource: &str, params: &[(&str, &str)]) -> Result<()> {
        self.record("DELETE", resource, None, params);
        self.handle_delete(resource, params)
    }

    async fn grab(&self, resource: &str, dest: &Path) -> Result<u64> {
        self.record("GET", resource, None, &[]);
        let parts = segments(resource);
        if parts.first().map(String::as_str) != Some("resource") || parts.len() < 2 {
            return Err(not_found(resource));
        }
        let body = self
            .resource(&parts[1..].join("/"))
            .ok_or_else(|| not_found(resource))?;
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}
