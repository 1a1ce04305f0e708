//! Error handling module for the replacer
//!
//! Provides centralized error types using thiserror. Every fallible
//! operation in the library returns [`Result`].

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for the replacer
#[derive(Error, Debug)]
pub enum ReplacerError {
    /// Configuration errors (malformed dictionary, unknown fields, bad pattern)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A replacement strategy failed for one dictionary entry
    #[error("Replacement failed for key `{key}`: {message}")]
    Strategy { key: String, message: String },

    /// The write for a markup artifact could not be issued at all
    #[error("Could not issue write to {}: {reason}", path.display())]
    WriteIssuance { path: PathBuf, reason: String },

    /// The write was issued but did not complete
    #[error("Write to {} failed: {source}", path.display())]
    WriteCompletion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO errors while loading configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for replacer operations
pub type Result<T> = std::result::Result<T, ReplacerError>;

impl ReplacerError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a strategy error for `key`
    pub fn strategy(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Strategy { key: key.into(), message: msg.into() }
    }

    /// Create a write issuance error
    pub fn write_issuance(path: &Path, reason: impl Into<String>) -> Self {
        Self::WriteIssuance { path: path.to_path_buf(), reason: reason.into() }
    }

    /// Create a write completion error
    pub fn write_completion(path: &Path, source: std::io::Error) -> Self {
        Self::WriteCompletion { path: path.to_path_buf(), source }
    }

    /// Whether this error happened while writing an artifact to disk.
    pub fn is_write_error(&self) -> bool {
        matches!(self, Self::WriteIssuance { .. } | Self::WriteCompletion { .. })
    }
}
