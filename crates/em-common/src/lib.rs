//! Emotion monitor common types, labels, timestamps, and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - The closed emotion label set with its emoji mapping
//! - Navigation pages
//! - Fixed-offset (IST) timestamps
//! - Common error types
//! - Configuration loading and resolution

pub mod config;
pub mod error;
pub mod label;
pub mod output;
pub mod page;
pub mod time;

pub use config::{ConfigPaths, ConfigResolver, MonitorConfig, StoreBackend, StoreSettings};
pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use label::{EmotionLabel, UnknownLabel};
pub use output::OutputFormat;
pub use page::Page;
pub use time::{IstTimestamp, IST, IST_OFFSET_SECS, IST_TZ};
