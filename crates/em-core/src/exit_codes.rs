//! Exit codes for the em-core CLI.
//!
//! Ranges:
//! - 0: success
//! - 10-19: user/environment errors
//! - 20-29: I/O errors outside the store

use em_common::{Error, ErrorCategory};

/// Process exit codes. Stable for scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Clean = 0,

    /// Invalid arguments.
    ArgsError = 10,

    /// Configuration or lexicon could not be loaded.
    ConfigError = 11,

    /// The classifier rejected the input or failed.
    InferenceError = 12,

    /// A telemetry table could not be opened, written, or read.
    StorageError = 13,

    /// Filesystem or serialization failure outside the store.
    IoError = 20,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Codes 10-19 can be fixed by the user.
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Exit code for a failed command.
    pub fn for_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Inference => ExitCode::InferenceError,
            ErrorCategory::Storage => ExitCode::StorageError,
            ErrorCategory::Io => ExitCode::IoError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}
