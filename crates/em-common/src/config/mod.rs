//! Configuration loading for the emotion monitor.
//!
//! This module provides:
//! - Typed configuration structures for `monitor.json`
//! - Deterministic config resolution (CLI > env > XDG > defaults)
//! - Data directory overrides for the telemetry store

pub mod resolve;

pub use resolve::{ConfigPaths, ConfigResolver};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Application name for XDG directories.
pub const APP_NAME: &str = "emotion_monitor";

/// Which storage engine backs the telemetry store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Durable Parquet segments on disk.
    #[default]
    Parquet,
    /// Process-local, lost on exit.
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Parquet => write!(f, "parquet"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Telemetry store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            backend: StoreBackend::Parquet,
            data_dir: default_data_dir(),
        }
    }
}

/// The complete loaded configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Telemetry store settings.
    pub store: StoreSettings,
    /// Optional keyword lexicon replacing the built-in one.
    pub lexicon_path: Option<PathBuf>,
}

impl MonitorConfig {
    /// Load configuration with resolution from CLI, env, or defaults.
    pub fn load(resolver: &ConfigResolver) -> Result<Self> {
        let mut config = match resolver.resolve_config_path() {
            (Some(path), _) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                serde_json::from_str::<MonitorConfig>(&content).map_err(|e| {
                    Error::Config(format!("failed to parse {}: {}", path.display(), e))
                })?
            }
            (None, _) => MonitorConfig::default(),
        };

        if let Some(dir) = resolver.resolve_data_dir_override() {
            config.store.data_dir = dir;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration semantically.
    pub fn validate(&self) -> Result<()> {
        if self.store.backend == StoreBackend::Parquet
            && self.store.data_dir.as_os_str().is_empty()
        {
            return Err(Error::Config(
                "store.data_dir must be set for the parquet backend".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default telemetry directory under the XDG data dir.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("telemetry")
}
