//! Persistence for workout settings and summaries.
//!
//! Everything is stored as string values in a key-value backend; the
//! [`SettingsStore`] owns key derivation and [`StoredRecord`] the record shape.

mod backend;
mod config;
pub mod database;
mod record;
mod store;

pub use backend::{KvBackend, MemoryBackend};
pub use config::{EngineConfig, StorageBackendKind, StorageConfig};
pub use database::SqliteBackend;
pub use record::StoredRecord;
pub use store::{SettingsStore, LAST_ACTIVE_WORKOUT_KEY, LAST_SETTINGS_KEY, SETTINGS_PREFIX};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/looptimer[-dev]/` based on LOOPTIMER_ENV.
///
/// Set LOOPTIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LOOPTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("looptimer-dev")
    } else {
        base_dir.join("looptimer")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}
