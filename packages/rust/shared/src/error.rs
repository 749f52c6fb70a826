//! Error types for leadpages.
//!
//! Library crates use [`LeadPagesError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all leadpages operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadPagesError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Delimited file could not be read or written.
    #[error("csv error in {path:?}: {message}")]
    Csv { path: PathBuf, message: String },

    /// Template missing, unreadable, or not registered.
    #[error("template error: {message}")]
    Template { message: String },

    /// Data validation error (empty slug, bad URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeadPagesError>;

impl LeadPagesError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a template error from any displayable message.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a csv failure with the file it came from.
    pub fn csv(path: impl Into<PathBuf>, msg: impl std::fmt::Display) -> Self {
        Self::Csv {
            path: path.into(),
            message: msg.to_string(),
        }
    }
}
