use crate::error::{GudsError, Result};
use crate::models::{OverwritePolicy, StatusPolicy};
use crate::ports::Confirm;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Blank credentials file written by `--write_json`
pub const CREDENTIALS_TEMPLATE: &str = "{\"url\":\"\",\n\"remote_username\":\"\",\n\"geoserver_username\":\"\",\n\"geoserver_password\":\"\",\n\"pem\":\"\",\n\"data\":\"\"}\n";

/// Default credentials file name
pub const DEFAULT_CREDENTIALS_FILE: &str = "geoserver.json";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from credentials file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Credentials resolved for one process run
#[derive(Debug, Clone)]
pub struct Credentials {
    pub url: String,
    pub geoserver_username: String,
    pub geoserver_password: String,
    pub remote_username: String,
    /// Data root on the server, used to report remote paths
    pub data: String,
    pub timeout_secs: Option<u64>,
}

impl Credentials {
    /// REST root, always ending in `rest/`
    pub fn rest_url(&self) -> Result<Url> {
        let mut base = self.url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let parsed = Url::parse(&base).map_err(|e| GudsError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        parsed.join("rest/").map_err(|e| GudsError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Remote location of a file placed under a basin
    pub fn remote_path(&self, basin: &str, file_name: &str) -> String {
        let root = self.data.trim_end_matches('/');
        if root.is_empty() {
            format!("basins/{}/{}", basin, file_name)
        } else {
            format!("{}/{}/{}", root, basin, file_name)
        }
    }
}

/// Layered credentials: defaults < file < environment < CLI
#[derive(Debug, Clone)]
pub struct LayeredCredentials {
    pub url: ConfigValue<String>,
    pub geoserver_username: ConfigValue<String>,
    pub geoserver_password: ConfigValue<String>,
    pub remote_username: ConfigValue<String>,
    pub pem: ConfigValue<Option<String>>,
    pub data: ConfigValue<String>,
    pub timeout_secs: ConfigValue<Option<u64>>,
}

impl LayeredCredentials {
    /// Create credentials with empty defaults
    pub fn with_defaults() -> Self {
        Self {
            url: ConfigValue::new(String::new(), ConfigSource::Default),
            geoserver_username: ConfigValue::new(String::new(), ConfigSource::Default),
            geoserver_password: ConfigValue::new(String::new(), ConfigSource::Default),
            remote_username: ConfigValue::new(String::new(), ConfigSource::Default),
            pem: ConfigValue::new(None, ConfigSource::Default),
            data: ConfigValue::new(String::new(), ConfigSource::Default),
            timeout_secs: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load credentials from a JSON file (or TOML, by extension)
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GudsError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| GudsError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read credentials file: {}", e),
        })?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        let file_config: FileCredentials = if is_toml {
            toml::from_str(&content).map_err(|e| GudsError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| GudsError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse JSON: {}", e),
            })?
        };

        if let Some(url) = file_config.url {
            self.url.update(url, ConfigSource::File);
        }
        if let Some(user) = file_config.geoserver_username {
            self.geoserver_username.update(user, ConfigSource::File);
        }
        if let Some(password) = file_config.geoserver_password {
            self.geoserver_password.update(password, ConfigSource::File);
        }
        if let Some(user) = file_config.remote_username {
            self.remote_username.update(user, ConfigSource::File);
        }
        // An empty pem in the template means "not set"
        if let Some(pem) = file_config.pem.filter(|p| !p.is_empty()) {
            self.pem.update(Some(pem), ConfigSource::File);
        }
        if let Some(data) = file_config.data {
            self.data.update(data, ConfigSource::File);
        }
        if let Some(timeout) = file_config.timeout_secs {
            self.timeout_secs.update(Some(timeout), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load credentials from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(url) = env::var("GUDS_URL") {
            self.url.update(url, ConfigSource::Environment);
        }
        if let Ok(user) = env::var("GUDS_GEOSERVER_USERNAME") {
            self.geoserver_username.update(user, ConfigSource::Environment);
        }
        if let Ok(password) = env::var("GUDS_GEOSERVER_PASSWORD") {
            self.geoserver_password.update(password, ConfigSource::Environment);
        }
        if let Ok(user) = env::var("GUDS_REMOTE_USERNAME") {
            self.remote_username.update(user, ConfigSource::Environment);
        }
        if let Ok(data) = env::var("GUDS_DATA") {
            self.data.update(data, ConfigSource::Environment);
        }
        if let Ok(timeout_str) = env::var("GUDS_TIMEOUT_SECS") {
            match timeout_str.parse::<u64>() {
                Ok(timeout) => self.timeout_secs.update(Some(timeout), ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GUDS_TIMEOUT_SECS value '{}': expected whole seconds",
                    timeout_str
                ),
            }
        }

        self
    }

    /// Update credentials from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliCredentialOverrides) {
        if let Some(url) = overrides.url {
            self.url.update(url, ConfigSource::Cli);
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs.update(Some(timeout), ConfigSource::Cli);
        }
    }

    /// Resolve into credentials, checking required keys
    pub fn resolve(self) -> Result<Credentials> {
        for (key, value) in [
            ("url", &self.url.value),
            ("geoserver_username", &self.geoserver_username.value),
            ("geoserver_password", &self.geoserver_password.value),
        ] {
            if value.trim().is_empty() {
                return Err(GudsError::ConfigMissing {
                    key: key.to_string(),
                });
            }
        }

        let credentials = Credentials {
            url: self.url.value,
            geoserver_username: self.geoserver_username.value,
            geoserver_password: self.geoserver_password.value,
            remote_username: self.remote_username.value,
            data: self.data.value,
            timeout_secs: self.timeout_secs.value,
        };
        credentials.rest_url()?;
        Ok(credentials)
    }

    /// Every key with its value and source, sorted by key, password masked
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();

        map.insert("url".to_string(), (self.url.value.clone(), self.url.source));
        map.insert(
            "geoserver_username".to_string(),
            (self.geoserver_username.value.clone(), self.geoserver_username.source),
        );
        map.insert(
            "geoserver_password".to_string(),
            ("********".to_string(), self.geoserver_password.source),
        );
        map.insert(
            "remote_username".to_string(),
            (self.remote_username.value.clone(), self.remote_username.source),
        );
        map.insert(
            "pem".to_string(),
            (
                self.pem.value.clone().unwrap_or_else(|| "none".to_string()),
                self.pem.source,
            ),
        );
        map.insert("data".to_string(), (self.data.value.clone(), self.data.source));
        map.insert(
            "timeout_secs".to_string(),
            (
                self.timeout_secs
                    .value
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                self.timeout_secs.source,
            ),
        );

        map
    }
}

/// Credentials as stored on disk
#[derive(Debug, Deserialize, Serialize)]
struct FileCredentials {
    url: Option<String>,
    remote_username: Option<String>,
    geoserver_username: Option<String>,
    geoserver_password: Option<String>,
    pem: Option<String>,
    data: Option<String>,
    timeout_secs: Option<u64>,
}

/// CLI credential overrides
#[derive(Debug, Default)]
pub struct CliCredentialOverrides {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Per-run behaviour of the publisher
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub overwrite: OverwritePolicy,
    pub status: StatusPolicy,
    /// Scratch directory for prepared files
    pub scratch_dir: PathBuf,
    /// Remove the scratch directory after an upload
    pub cleanup: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            overwrite: OverwritePolicy::Ask,
            status: StatusPolicy::Continue,
            scratch_dir: PathBuf::from("tmp"),
            cleanup: true,
        }
    }
}

/// Write the blank credentials template, asking before replacing a file
///
/// Returns `false` when an existing file was kept.
pub fn write_template(
    path: &Path,
    policy: OverwritePolicy,
    confirm: &dyn Confirm,
) -> Result<bool> {
    if path.exists() {
        let question = format!(
            "You are about to overwrite an existing {}.\nDo you want to continue?",
            path.display()
        );
        if !policy.allow_overwrite(confirm, &question)? {
            tracing::warn!("Keeping existing {}", path.display());
            return Ok(false);
        }
    }
    fs::write(path, CREDENTIALS_TEMPLATE)?;
    tracing::info!("Wrote blank credentials to {}", path.display());
    Ok(true)
}
