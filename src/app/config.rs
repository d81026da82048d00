// src/app/config.rs
//
// Attribution subsystem configuration.
//
// Every field has a default, so an empty JSON object (or no file at all) gives a
// runnable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Top-level configuration, loaded from JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    pub store: StoreConfig,
    pub parser: ParserConfig,
    pub service: ServiceConfig,
    pub resolver: ResolverConfig,
}

impl AttributionConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: AttributionConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.parser.campaign_param.trim().is_empty() {
            return Err(AppError::Config("parser.campaign_param must not be empty".to_string()));
        }
        if self.service.request_timeout_ms == 0 {
            return Err(AppError::Config("service.request_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Where attribution state is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Explicit database file; defaults to the platform data directory
    pub database_path: Option<PathBuf>,
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            pool_size: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Query parameter carrying the campaign suffix
    pub campaign_param: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            campaign_param: "utm_campaign".to_string(),
        }
    }
}

/// Referrer service endpoint. No endpoint means the service is not installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: Option<String>,
    pub request_timeout_ms: u64,
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Also mark "checked previously" after a fresh NotFound, so later runs replay
    /// NotFound from cache instead of asking the service again.
    pub persist_not_found: bool,

    /// Bound applied by callers that choose resolve_within(); None waits forever.
    pub wait_timeout_ms: Option<u64>,
}

impl ResolverConfig {
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }
}
