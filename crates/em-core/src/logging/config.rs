//! Logging configuration.
//!
//! Level sources, strongest first: `--log-level`, `EM_LOG`, then
//! `RUST_LOG`. `RUST_LOG` is taken as a full `EnvFilter` directive string,
//! so `RUST_LOG=hyper=trace` leaves the em crates alone. Format comes from
//! `--log-format` or `EM_LOG_FORMAT`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Environment variable holding the log level for the em crates.
pub const ENV_LOG_LEVEL: &str = "EM_LOG";

/// Environment variable holding the log format.
pub const ENV_LOG_FORMAT: &str = "EM_LOG_FORMAT";

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    #[value(alias = "console")]
    Human,
    /// One JSON object per line.
    #[value(alias = "json")]
    Jsonl,
}

/// Minimum level shown for the em crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    #[value(alias = "warning")]
    Warn,
    Error,
    #[value(alias = "quiet")]
    Off,
}

/// Parse a clap value name, ignoring case.
fn parse_value<T: ValueEnum>(raw: &str) -> Option<T> {
    T::from_str(raw.trim(), true).ok()
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        })
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        })
    }
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        use tracing_subscriber::filter::LevelFilter;
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Raw `RUST_LOG` directives; used instead of `level` when present.
    pub directives: Option<String>,
    /// Include timestamps in human output.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Warn,
            directives: None,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Read the process environment, then apply CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self::from_vars(
            var(ENV_LOG_LEVEL).as_deref(),
            var("RUST_LOG").as_deref(),
            var(ENV_LOG_FORMAT).as_deref(),
        )
        .with_overrides(cli_level, cli_format)
    }

    /// Resolve from explicit variable values. Unparseable values are ignored.
    pub fn from_vars(em_log: Option<&str>, rust_log: Option<&str>, format: Option<&str>) -> Self {
        let mut config = LogConfig::default();
        match em_log.and_then(parse_value::<LogLevel>) {
            Some(level) => config.level = level,
            None => {
                config.directives = rust_log
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string);
            }
        }
        if let Some(format) = format.and_then(parse_value::<LogFormat>) {
            config.format = format;
        }
        config
    }

    /// An explicit CLI level wins over any environment directives.
    pub fn with_overrides(mut self, level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        if let Some(level) = level {
            self.level = level;
            self.directives = None;
        }
        if let Some(format) = format {
            self.format = format;
        }
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}
