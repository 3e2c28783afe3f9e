//! Configuration resolution for the emotion monitor.
//!
//! Implements deterministic config resolution order:
//! 1. Explicit CLI flags (--config, --data-dir)
//! 2. Environment variables (EMOTION_MONITOR_CONFIG, EMOTION_MONITOR_DATA_DIR)
//! 3. XDG default (~/.config/emotion_monitor/monitor.json)
//! 4. Built-in defaults

use std::env;
use std::path::PathBuf;

use super::APP_NAME;

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG_PATH: &str = "EMOTION_MONITOR_CONFIG";

/// Environment variable overriding the telemetry data directory.
pub const ENV_DATA_DIR: &str = "EMOTION_MONITOR_DATA_DIR";

/// Standard config file name.
pub const CONFIG_FILENAME: &str = "monitor.json";

/// Paths supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicit path to monitor.json
    pub config_path: Option<PathBuf>,
    /// Explicit telemetry data directory
    pub data_dir: Option<PathBuf>,
}

/// How a config file was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigResolution {
    /// From explicit CLI flag
    CliFlag,
    /// From environment variable
    EnvVar,
    /// From XDG config directory
    XdgConfig,
    /// Using built-in defaults
    Default,
}

impl std::fmt::Display for ConfigResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigResolution::CliFlag => write!(f, "cli"),
            ConfigResolution::EnvVar => write!(f, "env"),
            ConfigResolution::XdgConfig => write!(f, "xdg"),
            ConfigResolution::Default => write!(f, "default"),
        }
    }
}

/// Configuration resolver with deterministic resolution order.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    cli_paths: ConfigPaths,
}

impl ConfigResolver {
    /// Create a new resolver with CLI paths.
    pub fn new(paths: ConfigPaths) -> Self {
        ConfigResolver { cli_paths: paths }
    }

    /// Resolve the XDG config directory.
    pub fn resolve_config_dir(&self) -> Option<PathBuf> {
        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join(APP_NAME));
        }
        dirs::config_dir().map(|d| d.join(APP_NAME))
    }

    /// Resolve the monitor.json path.
    pub fn resolve_config_path(&self) -> (Option<PathBuf>, ConfigResolution) {
        // 1. CLI flag
        if let Some(ref path) = self.cli_paths.config_path {
            return (Some(path.clone()), ConfigResolution::CliFlag);
        }

        // 2. Env var
        if let Ok(path) = env::var(ENV_CONFIG_PATH) {
            return (Some(PathBuf::from(path)), ConfigResolution::EnvVar);
        }

        // 3. XDG config dir, only if the file exists
        if let Some(config_dir) = self.resolve_config_dir() {
            let path = config_dir.join(CONFIG_FILENAME);
            if path.exists() {
                return (Some(path), ConfigResolution::XdgConfig);
            }
        }

        (None, ConfigResolution::Default)
    }

    /// Resolve a data directory that overrides the config file.
    pub fn resolve_data_dir_override(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.cli_paths.data_dir {
            return Some(dir.clone());
        }
        env::var(ENV_DATA_DIR).ok().map(PathBuf::from)
    }
}
