use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::SessionBackend;
use crate::{Result, StoreError};

/// In-memory session backend for testing.
///
/// Clones share the same map, so a store reopened on a clone sees what the
/// previous store wrote, like a reload in the same process.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    entries: Arc<RwLock<HashMap<String, String>>>,
    fail_on_save: Arc<AtomicBool>,
    fail_on_clear: Arc<AtomicBool>,
}

impl InMemoryBackend {
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent saves fail, to exercise error paths.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent clears fail.
    pub fn set_fail_on_clear(&self, fail: bool) {
        self.fail_on_clear.store(fail, Ordering::SeqCst);
    }

    /// Returns the raw stored value for a key.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Overwrites a raw value, bypassing the store.
    pub async fn put_raw(&self, key: &str, value: impl Into<String>) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.into());
    }

    /// Returns the number of stored keys.
    pub async fn key_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl SessionBackend for InMemoryBackend {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, entries: Vec<(&'static str, String)>) -> Result<()> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("storage is full".to_string()));
        }
        let mut map = self.entries.write().await;
        for (key, value) in entries {
            map.insert(key.to_string(), value);
        }
        Ok(())
    }

    async fn clear(&self, keys: &[&'static str]) -> Result<()> {
        if self.fail_on_clear.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("storage is locked".to_string()));
        }
        let mut map = self.entries.write().await;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}
