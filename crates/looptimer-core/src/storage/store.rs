//! Settings store: key derivation over a [`KvBackend`].

use std::sync::Arc;

use super::backend::KvBackend;
use super::record::StoredRecord;
use crate::error::StorageError;

pub const SETTINGS_PREFIX: &str = "@workout_settings_";
/// Record of whichever workout was saved last.
pub const LAST_SETTINGS_KEY: &str = "@workout_settings_last";
pub const LAST_ACTIVE_WORKOUT_KEY: &str = "@last_activity_workout_id";

/// Raw per-workout record storage. No validation, no defaults.
#[derive(Clone)]
pub struct SettingsStore {
    backend: Arc<dyn KvBackend>,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn KvBackend> {
        Arc::clone(&self.backend)
    }

    pub fn settings_key(workout_id: &str) -> String {
        format!("{SETTINGS_PREFIX}{workout_id}")
    }

    pub async fn get(&self, workout_id: &str) -> Result<Option<StoredRecord>, StorageError> {
        let raw = self.backend.get(&Self::settings_key(workout_id)).await?;
        Ok(raw.map(|raw| StoredRecord::parse(&raw)))
    }

    /// Write the record, then make it the last-used record and mark the
    /// workout as last active. Stops at the first failing write.
    pub async fn put(&self, workout_id: &str, record: &StoredRecord) -> Result<(), StorageError> {
        let json = record.to_json()?;
        self.backend
            .set(&Self::settings_key(workout_id), &json)
            .await?;
        self.backend.set(LAST_SETTINGS_KEY, &json).await?;
        self.backend.set(LAST_ACTIVE_WORKOUT_KEY, workout_id).await?;
        Ok(())
    }

    pub async fn last_used(&self) -> Result<Option<StoredRecord>, StorageError> {
        let raw = self.backend.get(LAST_SETTINGS_KEY).await?;
        Ok(raw.map(|raw| StoredRecord::parse(&raw)))
    }

    pub async fn last_active_workout_id(&self) -> Result<Option<String>, StorageError> {
        self.backend.get(LAST_ACTIVE_WORKOUT_KEY).await
    }

    pub async fn set_last_active_workout_id(&self, workout_id: &str) -> Result<(), StorageError> {
        self.backend.set(LAST_ACTIVE_WORKOUT_KEY, workout_id).await
    }

    /// Remove every settings record, the last-used record included.
    pub async fn clear_all(&self) -> Result<usize, StorageError> {
        let keys: Vec<String> = self
            .backend
            .keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(SETTINGS_PREFIX))
            .collect();
        for key in &keys {
            self.backend.remove(key).await?;
        }
        tracing::info!(removed = keys.len(), "cleared workout settings");
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::WorkoutConfiguration;
    use crate::storage::MemoryBackend;

    fn store() -> (Arc<MemoryBackend>, SettingsStore) {
        let backend = Arc::new(MemoryBackend::new());
        (backend.clone(), SettingsStore::new(backend))
    }

    #[tokio::test]
    async fn put_updates_side_records() {
        let (backend, store) = store();
        let record = StoredRecord::encode(&WorkoutConfiguration::defaults("arms"));
        store.put("arms", &record).await.unwrap();

        assert_eq!(store.get("arms").await.unwrap(), Some(record.clone()));
        assert_eq!(store.last_used().await.unwrap(), Some(record));
        assert_eq!(
            store.last_active_workout_id().await.unwrap().as_deref(),
            Some("arms")
        );
        assert!(backend
            .get("@workout_settings_arms")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let (_, store) = store();
        assert!(store.get("nothing").await.unwrap().is_none());
        assert!(store.last_used().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_failure_is_reported() {
        let (backend, store) = store();
        backend.set_write_failure(true);
        let record = StoredRecord::encode(&WorkoutConfiguration::defaults("arms"));
        assert!(store.put("arms", &record).await.is_err());
    }

    #[tokio::test]
    async fn clear_all_keeps_unrelated_keys() {
        let (backend, store) = store();
        for id in ["a", "b"] {
            let record = StoredRecord::encode(&WorkoutConfiguration::defaults(id));
            store.put(id, &record).await.unwrap();
        }
        backend.set("workoutSummaries", "[]").await.unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 3);
        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.last_used().await.unwrap().is_none());
        assert!(backend.get("workoutSummaries").await.unwrap().is_some());
        assert!(store.last_active_workout_id().await.unwrap().is_some());
    }
}
