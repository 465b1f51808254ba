//! TOML-based engine configuration.
//!
//! Stores host-level preferences:
//! - Which storage backend holds workout settings
//! - Default workout name for ad-hoc sessions
//! - Summary history length
//! - Log filter
//!
//! Configuration is stored at `~/.config/looptimer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::backend::{KvBackend, MemoryBackend};
use super::data_dir;
use super::database::SqliteBackend;
use super::store::SettingsStore;
use crate::error::{ConfigError, CoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Sqlite,
    Memory,
}

/// Storage-specific configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Overrides `<data_dir>/looptimer.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/looptimer/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_workout_name")]
    pub default_workout_name: String,
    #[serde(default = "default_summary_history_limit")]
    pub summary_history_limit: usize,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_workout_name() -> String {
    "Quick Workout".into()
}
fn default_summary_history_limit() -> usize {
    100
}
fn default_log_filter() -> String {
    "info".into()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            default_workout_name: default_workout_name(),
            summary_history_limit: default_summary_history_limit(),
            log_filter: default_log_filter(),
        }
    }
}

impl EngineConfig {
    fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        if path.exists() {
            return Ok(Self::load_from(&path)?);
        }
        let cfg = Self::default();
        cfg.save_to(&path)?;
        Ok(cfg)
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default engine config");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        Ok(self.save_to(&Self::path()?)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Build the settings store this configuration points at.
    pub fn open_store(&self) -> Result<SettingsStore, CoreError> {
        let backend: Arc<dyn KvBackend> = match self.storage.backend {
            StorageBackendKind::Memory => Arc::new(MemoryBackend::new()),
            StorageBackendKind::Sqlite => match &self.storage.database_path {
                Some(path) => Arc::new(SqliteBackend::open_at(path)?),
                None => Arc::new(SqliteBackend::open()?),
            },
        };
        Ok(SettingsStore::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_workout_name, "Quick Workout");
        assert_eq!(parsed.summary_history_limit, 100);
        assert_eq!(parsed.storage.backend, StorageBackendKind::Sqlite);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let parsed: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.log_filter, "info");
        assert!(parsed.storage.database_path.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed: EngineConfig = toml::from_str(
            r#"
            summary_history_limit = 10

            [storage]
            backend = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.summary_history_limit, 10);
        assert_eq!(parsed.storage.backend, StorageBackendKind::Memory);
        assert_eq!(parsed.default_workout_name, "Quick Workout");
    }

    #[test]
    fn save_to_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = EngineConfig::default();
        cfg.default_workout_name = "Tabata".into();
        cfg.save_to(&path).unwrap();
        let loaded = EngineConfig::load_from(&path).unwrap();
        assert_eq!(loaded.default_workout_name, "Tabata");
    }

    #[test]
    fn load_from_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "summary_history_limit = \"lots\"").unwrap();
        assert!(matches!(
            EngineConfig::load_from(&path),
            Err(ConfigError::ParseFailed(_))
        ));
    }

    #[tokio::test]
    async fn open_store_uses_configured_database_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = EngineConfig::default();
        cfg.storage.database_path = Some(dir.path().join("settings.db"));
        let store = cfg.open_store().unwrap();
        store.set_last_active_workout_id("w").await.unwrap();
        assert!(dir.path().join("settings.db").exists());
    }
}
