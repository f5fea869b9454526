//! Error taxonomy
//!
//! Fatal errors (bad configuration, bad root) abort a run before traversal.
//! Per-file failures are collected as [`FileError`] and never abort.

use serde::Serialize;
use thiserror::Error;

/// Result alias for fallible engine entry points
pub type Result<T> = std::result::Result<T, CodesightError>;

/// Errors that abort a collation run
#[derive(Debug, Error)]
pub enum CodesightError {
    /// Required keys missing, wrong types, or malformed values
    #[error("configuration error: {0}")]
    Config(String),

    /// Root path missing or not a directory
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// IO failure outside per-file processing (e.g. reading the user config)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodesightError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }
}

/// A file that was skipped because it could not be read or transformed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{path}: {message}")]
pub struct FileError {
    /// Path relative to the collation root
    pub path: String,
    pub message: String,
}

impl FileError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}
