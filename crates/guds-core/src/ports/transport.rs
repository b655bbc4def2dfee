use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use crate::error::Result;

/// Port for GeoServer REST access
///
/// Resources are paths relative to the REST root (`.../rest/`). Absolute
/// URLs returned by the server in `href` fields are accepted as well.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a resource and parse the JSON response
    async fn get(&self, resource: &str) -> Result<Value>;

    /// POST a JSON payload (create)
    async fn post(&self, resource: &str, payload: &Value) -> Result<()>;

    /// PUT a JSON payload (modify)
    async fn put(&self, resource: &str, payload: &Value) -> Result<()>;

    /// PUT a raw body (file placement, SLD bodies)
    async fn put_body(&self, resource: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// DELETE a resource with query parameters
    async fn delete(&self, resource: &str, params: &[(&str, &str)]) -> Result<()>;

    /// Stream a resource into a local file, returning bytes written
    async fn grab(&self, resource: &str, dest: &Path) -> Result<u64>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, resource: &str) -> Result<Value> {
        (**self).get(resource).await
    }

    async fn post(&self, resource: &str, payload: &Value) -> Result<()> {
        (**self).post(resource, payload).await
    }

    async fn put(&self, resource: &str, payload: &Value) -> Result<()> {
        (**self).put(resource, payload).await
    }

    async fn put_body(&self, resource: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        (**self).put_body(resource, body, content_type).await
    }

    async fn delete(&self, resource: &str, params: &[(&str, &str)]) -> Result<()> {
        (**self).delete(resource, params).await
    }

    async fn grab(&self, resource: &str, dest: &Path) -> Result<u64> {
        (**self).grab(resource, dest).await
    }
}
