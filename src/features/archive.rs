// Archival stats store
// Read-only snapshots for seasons upstream no longer serves

use std::sync::Arc;
use tracing::{debug, info};

use crate::api::store::{KeyValueStore, StoreError};
use crate::models::player::PlayerRecord;

/// 32-bit string hash (`h = 31 * h + unit` over UTF-16 code units, wrapping)
pub fn hash_code(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Store key of a handle's snapshot
pub fn archive_key(handle: &str) -> String {
    format!("archive/{}", hash_code(&handle.to_lowercase()))
}

pub struct ArchivalStore {
    store: Arc<dyn KeyValueStore>,
}

impl ArchivalStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Snapshot for a handle, or `None` if it was never archived
    pub async fn lookup(&self, handle: &str) -> Result<Option<PlayerRecord>, StoreError> {
        let key = archive_key(handle);
        let bytes = match self.store.get(&key).await? {
            Some(b) => b,
            None => {
                debug!(handle, key = %key, "No archival snapshot");
                return Ok(None);
            }
        };

        let record: PlayerRecord =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))?;
        info!(handle, key = %key, "Archival snapshot found");
        Ok(Some(record))
    }
}
