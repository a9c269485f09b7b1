//! Configuration management for the derivative pipeline.
//!
//! All sub-structs implement `Default` with the reference policy values,
//! so an embedder can start with `Config::default()` and override only
//! what it needs, or load a TOML file with `Config::load_from`.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upload acceptance policy
    pub uploads: UploadLimits,

    /// Transform targets per variant kind
    pub derivatives: DerivativeConfig,

    /// Resource limits
    pub limits: RuntimeLimits,

    /// Asset storage settings
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the resolved asset root path (with ~ expansion).
    pub fn asset_root(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.storage.asset_root);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
