//! Settings resolution chain.
//!
//! A workout id resolves, in order, to:
//!
//! 1. its own stored record merged over the defaults,
//! 2. the last-used record (whichever workout was saved last), relabelled,
//! 3. the hard-coded defaults.
//!
//! A never-configured workout therefore inherits the most recent tuning.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::model::WorkoutConfiguration;
use crate::error::{CoreError, StorageError};
use crate::storage::{SettingsStore, StoredRecord};

#[derive(Clone)]
pub struct SettingsResolver {
    store: SettingsStore,
    /// Serializes read-modify-write cycles issued through this resolver.
    edit_lock: Arc<Mutex<()>>,
}

impl SettingsResolver {
    pub fn new(store: SettingsStore) -> Self {
        Self {
            store,
            edit_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Defaults for `workout_id`, ignoring storage entirely.
    pub fn defaults(workout_id: &str) -> WorkoutConfiguration {
        WorkoutConfiguration::defaults(workout_id)
    }

    /// Resolve a complete configuration. Storage failures degrade to defaults.
    pub async fn resolve(&self, workout_id: &str) -> WorkoutConfiguration {
        match self.try_resolve(workout_id).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(workout_id, error = %e, "settings read failed, using defaults");
                WorkoutConfiguration::defaults(workout_id)
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but reports storage failures, so a
    /// writer never saves defaults over a record it could not read.
    pub async fn try_resolve(
        &self,
        workout_id: &str,
    ) -> Result<WorkoutConfiguration, StorageError> {
        if let Some(record) = self.store.get(workout_id).await? {
            tracing::debug!(workout_id, "resolved from own record");
            return Ok(record.resolve(workout_id));
        }
        if let Some(record) = self.store.last_used().await? {
            tracing::debug!(
                workout_id,
                from = record.workout_id().unwrap_or("?"),
                "resolved from last-used record"
            );
            return Ok(record.resolve(workout_id));
        }
        tracing::debug!(workout_id, "resolved to defaults");
        Ok(WorkoutConfiguration::defaults(workout_id))
    }

    /// Write the full configuration; it also becomes the last-used record.
    pub async fn save(&self, config: &WorkoutConfiguration) -> Result<(), StorageError> {
        let record = StoredRecord::encode(config);
        self.store.put(&config.workout_id, &record).await?;
        tracing::debug!(workout_id = %config.workout_id, "saved settings");
        Ok(())
    }

    /// Read the latest configuration, let `f` change it, and save it.
    ///
    /// Nothing is written when the read or `f` fails.
    pub async fn modify<T, F>(&self, workout_id: &str, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut WorkoutConfiguration) -> Result<T, CoreError>,
    {
        let _guard = self.edit_lock.lock().await;
        let mut config = self.try_resolve(workout_id).await?;
        let out = f(&mut config)?;
        self.save(&config).await?;
        Ok(out)
    }

    pub async fn last_active_workout_id(&self) -> Result<Option<String>, StorageError> {
        self.store.last_active_workout_id().await
    }

    pub async fn clear_all(&self) -> Result<usize, StorageError> {
        let _guard = self.edit_lock.lock().await;
        self.store.clear_all().await
    }
}
