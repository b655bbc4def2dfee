//! reqwest adapter for the GeoServer REST API

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::config::Credentials;
use crate::error::{GudsError, Result};
use crate::models::StatusPolicy;
use crate::ports::Transport;

const JSON: &str = "application/json";

/// Authenticated client for one GeoServer instance
pub struct GeoServerClient {
    base_url: Url,
    username: String,
    password: String,
    status_policy: StatusPolicy,
    client: reqwest::Client,
}

impl GeoServerClient {
    /// Create a client from resolved credentials
    pub fn new(credentials: &Credentials, status_policy: StatusPolicy) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = credentials.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: credentials.rest_url()?,
            username: credentials.geoserver_username.clone(),
            password: credentials.geoserver_password.clone(),
            status_policy,
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join a resource onto the REST root
    pub fn resolve(&self, resource: &str) -> Result<Url> {
        self.base_url.join(resource).map_err(|e| GudsError::InvalidUrl {
            url: resource.to_string(),
            reason: e.to_string(),
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    /// Log the status and apply the status policy
    fn handle_status(&self, resource: &str, status: StatusCode) -> Result<()> {
        match status.as_u16() {
            404 => {
                tracing::error!("Resource {} was not found on geoserver.", resource);
                Err(GudsError::RemoteNotFound {
                    resource: resource.to_string(),
                })
            }
            200 | 201 => {
                tracing::debug!("Resource {} was found successfully!", resource);
                Ok(())
            }
            302 => {
                tracing::debug!("Resource {} was redirected.", resource);
                Ok(())
            }
            code => {
                tracing::debug!("Status code received for {}: {}", resource, code);
                match self.status_policy {
                    StatusPolicy::Continue => Ok(()),
                    StatusPolicy::Fail if status.is_success() => Ok(()),
                    StatusPolicy::Fail => Err(GudsError::UnexpectedStatus {
                        resource: resource.to_string(),
                        status: code,
                    }),
                }
            }
        }
    }

    async fn send(&self, resource: &str, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        self.handle_status(resource, response.status())?;
        Ok(response)
    }
}

#[async_trait]
impl Transport for GeoServerClient {
    async fn get(&self, resource: &str) -> Result<Value> {
        let url = self.resolve(resource)?;
        tracing::debug!("GET request to {}", url);

        let builder = self.request(Method::GET, url).header(header::ACCEPT, JSON);
        let response = self.send(resource, builder).await?;
        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text)?;
        tracing::debug!("GET returns: {}", value);
        Ok(value)
    }

    async fn post(&self, resource: &str, payload: &Value) -> Result<()> {
        let url = self.resolve(resource)?;
        tracing::debug!("POST request to {}", url);

        let builder = self
            .request(Method::POST, url)
            .header(header::CONTENT_TYPE, JSON)
            .body(serde_json::to_vec(payload)?);
        let response = self.send(resource, builder).await?;
        tracing::debug!("POST request returns {}", response.status());
        Ok(())
    }

    async fn put(&self, resource: &str, payload: &Value) -> Result<()> {
        let url = self.resolve(resource)?;
        tracing::debug!("PUT request to {}", url);

        let builder = self
            .request(Method::PUT, url)
            .header(header::ACCEPT, JSON)
            .header(header::CONTENT_TYPE, JSON)
            .body(serde_json::to_vec(payload)?);
        let response = self.send(resource, builder).await?;
        tracing::debug!("Response from PUT: {}", response.status());
        Ok(())
    }

    async fn put_body(&self, resource: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let url = self.resolve(resource)?;
        tracing::debug!("PUT request to {} ({} bytes, {})", url, body.len(), content_type);

        let builder = self
            .request(Method::PUT, url)
            .header(header::ACCEPT, content_type)
            .header(header::CONTENT_TYPE, content_type)
            .body(body);
        let response = self.send(resource, builder).await?;
        tracing::debug!("Response from PUT: {}", response.status());
        Ok(())
    }

    async fn delete(&self, resource: &str, params: &[(&str, &str)]) -> Result<()> {
        let mut url = self.resolve(resource)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        tracing::debug!("DELETE request to {}", url);

        let builder = self.request(Method::DELETE, url).header(header::CONTENT_TYPE, JSON);
        let response = self.send(resource, builder).await?;
        tracing::debug!("Response from DELETE: {}", response.status());
        Ok(())
    }

    async fn grab(&self, resource: &str, dest: &Path) -> Result<u64> {
        let url = self.resolve(resource)?;
        tracing::debug!("GET/GRAB request to {}", url);

        let mut response = self.send(resource, self.request(Method::GET, url)).await?;

        tracing::info!("Writing data to {}...", dest.display());
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::info!("File download complete. Written to {}", dest.display());
        Ok(written)
    }
}
