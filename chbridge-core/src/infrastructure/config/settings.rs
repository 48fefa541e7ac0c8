// chbridge-core/src/infrastructure/config/settings.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use validator::{Validate, ValidationError};

use crate::infrastructure::adapters::delimited::resolve_delimiter;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_FILES: [&str; 2] = ["chbridge.yaml", "chbridge.yml"];

pub const ENV_BASE_URL: &str = "CHBRIDGE_BASE_URL";
pub const ENV_BATCH_SIZE: &str = "CHBRIDGE_BATCH_SIZE";
pub const ENV_EXPORT_DESTINATION: &str = "CHBRIDGE_EXPORT_DESTINATION";

// --- CONFIGURATION STRUCTS ---

#[derive(Debug, Serialize, Deserialize, Validate, Clone, Default, PartialEq)]
pub struct BridgeConfig {
    #[validate(nested)]
    #[serde(default)]
    pub service: ServiceConfig,

    #[validate(nested)]
    #[serde(default)]
    pub transfer: TransferConfig,

    #[validate(nested)]
    #[serde(default)]
    pub file: FileConfig,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct ServiceConfig {
    #[validate(length(min = 1, message = "Base URL cannot be empty"))]
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    #[validate(range(min = 1, message = "Timeout must be at least one second"))]
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct TransferConfig {
    #[validate(range(min = 1, message = "Batch size must be at least 1"))]
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    #[validate(length(min = 1, message = "Export destination cannot be empty"))]
    #[serde(rename = "export-destination", default = "default_export_destination")]
    pub export_destination: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            export_destination: default_export_destination(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct FileConfig {
    #[validate(custom(function = "validate_delimiter"))]
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api/clickhouse".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_batch_size() -> usize {
    1000
}
fn default_export_destination() -> String {
    "export.csv".to_string()
}
fn default_delimiter() -> String {
    ",".to_string()
}

fn validate_delimiter(delimiter: &str) -> Result<(), ValidationError> {
    resolve_delimiter(delimiter)
        .map(|_| ())
        .map_err(|e| ValidationError::new("delimiter").with_message(e.to_string().into()))
}

// --- LOADING ---

/// Loads `chbridge.yaml` (or `.yml`) from `project_dir`, then layers the
/// `CHBRIDGE_*` environment variables on top. A missing file yields defaults.
pub fn load_config(project_dir: &Path) -> Result<BridgeConfig, InfrastructureError> {
    let mut config = match CONFIG_FILES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|p| p.exists())
    {
        Some(path) => {
            debug!(path = %path.display(), "Reading configuration");
            let content = fs::read_to_string(&path).map_err(InfrastructureError::Io)?;
            if content.trim().is_empty() {
                BridgeConfig::default()
            } else {
                serde_yaml::from_str(&content).map_err(InfrastructureError::YamlError)?
            }
        }
        None => {
            info!(dir = %project_dir.display(), "No chbridge.yaml found, using defaults");
            BridgeConfig::default()
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    config
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;
    Ok(config)
}

/// Applies overrides read through `lookup`. Blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut BridgeConfig, lookup: F) -> Result<(), InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_BASE_URL) {
        config.service.base_url = url;
    }
    if let Some(raw) = get(ENV_BATCH_SIZE) {
        config.transfer.batch_size = raw.trim().parse().map_err(|_| {
            InfrastructureError::ConfigError(format!(
                "{} must be a positive integer, got '{}'",
                ENV_BATCH_SIZE, raw
            ))
        })?;
    }
    if let Some(destination) = get(ENV_EXPORT_DESTINATION) {
        config.transfer.export_destination = destination;
    }
    Ok(())
}
