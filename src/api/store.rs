// Key-value store capability
// Persistent storage for identity mappings and archival snapshots

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
    #[error("Stored value could not be decoded: {0}")]
    Decode(String),
}

/// Byte-valued key-value store. Keys look like `collection/id`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
}

/// Process-local store, used when no Firestore credentials are configured
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("identity/1").await.unwrap(), None);

        store.set("identity/1", b"first".to_vec()).await.unwrap();
        store.set("identity/1", b"second".to_vec()).await.unwrap();

        assert_eq!(
            store.get("identity/1").await.unwrap(),
            Some(b"second".to_vec())
        );
    }
}
