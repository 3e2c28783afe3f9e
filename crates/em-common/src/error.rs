//! Error types for the emotion monitor.
//!
//! Every failure surfaced to the presentation layer goes through [`Error`],
//! which carries:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for the caller (nothing is retried internally)
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Storage Unavailable
//!   Reason: storage unavailable: page_visited_table: Permission denied (os error 13)
//!   Fix: Check that the data directory exists and is writable, then retry.
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for emotion monitor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Classification oracle errors.
    Inference,
    /// Telemetry store errors (medium, schema, records).
    Storage,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Inference => write!(f, "inference"),
            ErrorCategory::Storage => write!(f, "storage"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the emotion monitor.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid lexicon: {0}")]
    InvalidLexicon(String),

    // Inference errors (30-39)
    #[error("inference failed: {0}")]
    InferenceFailure(String),

    #[error("invalid class distribution: {0}")]
    InvalidDistribution(String),

    // Storage errors (60-69)
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("schema initialization failed for {table}: {reason}")]
    SchemaInitialization { table: String, reason: String },

    #[error("record does not match schema of {table}: {reason}")]
    SchemaMismatch { table: String, reason: String },

    #[error("corrupt record in {table}: {reason}")]
    CorruptRecord { table: String, reason: String },

    // I/O errors (70-79)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 30-39: Inference errors
    /// - 60-69: Storage errors
    /// - 70-79: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidLexicon(_) => 11,
            Error::InferenceFailure(_) => 30,
            Error::InvalidDistribution(_) => 31,
            Error::StorageUnavailable(_) => 60,
            Error::SchemaInitialization { .. } => 61,
            Error::SchemaMismatch { .. } => 62,
            Error::CorruptRecord { .. } => 63,
            Error::Io(_) => 70,
            Error::Json(_) => 71,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidLexicon(_) => ErrorCategory::Config,
            Error::InferenceFailure(_) | Error::InvalidDistribution(_) => ErrorCategory::Inference,
            Error::StorageUnavailable(_)
            | Error::SchemaInitialization { .. }
            | Error::SchemaMismatch { .. }
            | Error::CorruptRecord { .. } => ErrorCategory::Storage,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the caller may reasonably retry the operation.
    ///
    /// The store never retries on its own; this is a hint only.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidLexicon(_) => true,

            // Different input may classify fine
            Error::InferenceFailure(_) => true,
            Error::InvalidDistribution(_) => false,

            // Disk full, lock contention, permissions: transient
            Error::StorageUnavailable(_) => true,
            // Fatal for this process until resolved
            Error::SchemaInitialization { .. } => false,
            Error::SchemaMismatch { .. } => false,
            Error::CorruptRecord { .. } => false,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Check monitor.json syntax, or remove it to use built-in defaults.",
            Error::InvalidLexicon(_) => {
                "The lexicon file must map known emotion labels to keyword lists."
            }
            Error::InferenceFailure(_) => "Enter some text to analyze and try again.",
            Error::InvalidDistribution(_) => {
                "The classifier produced an invalid distribution. Report this with the input text."
            }
            Error::StorageUnavailable(_) => {
                "Check that the data directory exists and is writable, then retry."
            }
            Error::SchemaInitialization { .. } => {
                "The table layout on disk conflicts with this version. \
                 Move the data directory aside."
            }
            Error::SchemaMismatch { .. } => "Internal record layout error. Report this as a bug.",
            Error::CorruptRecord { .. } => {
                "A stored segment could not be decoded. Inspect or remove the damaged file."
            }
            Error::Io(_) => "Check disk space and permissions. Retry the operation.",
            Error::Json(_) => "Invalid JSON in file. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidLexicon(_) => "Invalid Lexicon",
            Error::InferenceFailure(_) => "Inference Failed",
            Error::InvalidDistribution(_) => "Invalid Class Distribution",
            Error::StorageUnavailable(_) => "Storage Unavailable",
            Error::SchemaInitialization { .. } => "Schema Initialization Failed",
            Error::SchemaMismatch { .. } => "Schema Mismatch",
            Error::CorruptRecord { .. } => "Corrupt Record",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., table name).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::SchemaInitialization { table, .. }
            | Error::SchemaMismatch { table, .. }
            | Error::CorruptRecord { table, .. } => {
                context.insert("table".to_string(), serde_json::json!(table));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation(),
    )
}
