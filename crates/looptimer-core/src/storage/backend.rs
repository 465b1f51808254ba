//! Key-value backends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;

/// Asynchronous string key-value storage.
///
/// Every call may suspend and may fail; callers decide whether a failure
/// degrades to defaults (reads) or is reported (writes).
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-process backend.
///
/// Reads and writes can be switched to fail, which is how hosts and tests
/// exercise the degraded paths without a real I/O fault.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_failure(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_write_failure(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("read rejected".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("write rejected".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_read()?;
        Ok(self.entries.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_write()?;
        self.entries.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_write()?;
        self.entries.lock()?.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check_read()?;
        let mut keys: Vec<String> = self.entries.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        assert!(backend.get("k").await.unwrap().is_none());
        backend.set("k", "v").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
        backend.remove("k").await.unwrap();
        backend.remove("k").await.unwrap();
        assert!(backend.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn switched_failures_surface_as_unavailable() {
        let backend = MemoryBackend::new();
        backend.set_write_failure(true);
        assert!(matches!(
            backend.set("k", "v").await,
            Err(StorageError::Unavailable(_))
        ));
        backend.set_write_failure(false);
        backend.set("k", "v").await.unwrap();

        backend.set_read_failure(true);
        assert!(backend.get("k").await.is_err());
        assert!(backend.keys().await.is_err());
    }
}
