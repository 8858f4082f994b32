use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// String-keyed store of string values, last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` if nothing was ever written.
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Replace the value under `key`.
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Process-local store, used in tests and when no durable location is wanted.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
