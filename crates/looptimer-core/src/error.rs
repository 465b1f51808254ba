//! Core error types for looptimer-core.
//!
//! Storage, configuration and validation failures each get their own enum;
//! `CoreError` ties them together for the engine facade.

use std::path::PathBuf;
use thiserror::Error;

use crate::settings::BlockKind;

/// Core error type for looptimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Engine configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The addressed block does not exist on the workout
    #[error("Block '{block_id}' not found on workout '{workout_id}'")]
    BlockNotFound { workout_id: String, block_id: String },

    /// An update carried a payload for a different block kind
    #[error("Block '{block_id}' is a {found} block, update was for {expected}")]
    BlockKindMismatch {
        block_id: String,
        expected: BlockKind,
        found: BlockKind,
    },

    /// The tick driver task is gone
    #[error("Timer driver is no longer running")]
    TimerClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Storage-specific errors.
///
/// Every variant is recoverable: readers degrade to defaults, writers report.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the SQLite file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database (or in-memory map) is locked
    #[error("Storage is locked")]
    Locked,

    /// Backend refused the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A blocking storage task panicked or was cancelled
    #[error("Storage task failed: {0}")]
    TaskFailed(String),

    /// Record could not be encoded
    #[error("Failed to encode record: {0}")]
    Encode(String),

    /// Data directory could not be determined or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A duration, pace or target that must be at least one
    #[error("'{field}' must be positive")]
    NonPositive { field: &'static str },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::TaskFailed(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StorageError::Locked
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
