//! Error types for tend

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tend operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Persisted data exists but cannot be read back. Surfaced instead of
    /// silently replacing state with an empty blob, which would look like
    /// data loss to the caller.
    #[error("Corrupt data in {path}: {reason}")]
    CorruptData { path: PathBuf, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for tend operations
pub type Result<T> = std::result::Result<T, Error>;
