// Identity cache
// Maps a messaging account to the handle it asked us to remember,
// plus the account's private nicknames for other handles

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::store::{KeyValueStore, StoreError};
use crate::features::errors::StatsError;

#[derive(Debug, Serialize, Deserialize)]
struct IdentityMapping {
    handle: String,
}

/// Nickname to handle, per account
type NickMap = BTreeMap<String, String>;

fn identity_key(account_id: &str) -> String {
    format!("identity/{}", account_id)
}

fn nick_key(account_id: &str) -> String {
    format!("nick/{}", account_id)
}

/// Thin wrapper over the key-value store; every call round-trips
pub struct IdentityCache {
    store: Arc<dyn KeyValueStore>,
}

impl IdentityCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Upsert the handle for an account
    pub async fn remember(&self, account_id: &str, handle: &str) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&IdentityMapping {
            handle: handle.to_string(),
        })
        .map_err(|e| StoreError::Decode(e.to_string()))?;

        self.store.set(&identity_key(account_id), bytes).await?;
        info!(account_id, handle, "Remembered handle");
        Ok(())
    }

    /// Remembered handle, or `NotMapped`
    pub async fn recall(&self, account_id: &str) -> Result<String, StatsError> {
        let bytes = match self.store.get(&identity_key(account_id)).await? {
            Some(b) => b,
            None => {
                debug!(account_id, "No handle mapped");
                return Err(StatsError::NotMapped);
            }
        };

        let mapping: IdentityMapping = serde_json::from_slice(&bytes)
            .map_err(|e| StatsError::Store(StoreError::Decode(e.to_string())))?;
        Ok(mapping.handle)
    }

    async fn load_nicks(&self, account_id: &str) -> Result<NickMap, StoreError> {
        match self.store.get(&nick_key(account_id)).await? {
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
            }
            None => Ok(NickMap::new()),
        }
    }

    async fn save_nicks(&self, account_id: &str, nicks: &NickMap) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(nicks).map_err(|e| StoreError::Decode(e.to_string()))?;
        self.store.set(&nick_key(account_id), bytes).await
    }

    /// Upsert a nickname for a handle
    pub async fn remember_nick(
        &self,
        account_id: &str,
        nick: &str,
        handle: &str,
    ) -> Result<(), StoreError> {
        let mut nicks = self.load_nicks(account_id).await?;
        nicks.insert(nick.to_string(), handle.to_string());
        self.save_nicks(account_id, &nicks).await?;
        info!(account_id, nick, handle, "Remembered nickname");
        Ok(())
    }

    pub async fn recall_nick(
        &self,
        account_id: &str,
        nick: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(self.load_nicks(account_id).await?.remove(nick))
    }

    /// Drop a nickname. Returns whether it existed.
    pub async fn forget_nick(&self, account_id: &str, nick: &str) -> Result<bool, StoreError> {
        let mut nicks = self.load_nicks(account_id).await?;
        if nicks.remove(nick).is_none() {
            return Ok(false);
        }
        self.save_nicks(account_id, &nicks).await?;
        info!(account_id, nick, "Forgot nickname");
        Ok(true)
    }

    /// The handle a nickname stands for, or the input unchanged
    pub async fn expand(&self, account_id: &str, handle: &str) -> Result<String, StoreError> {
        match self.recall_nick(account_id, handle).await? {
            Some(target) => {
                debug!(account_id, nick = handle, handle = %target, "Expanded nickname");
                Ok(target)
            }
            None => Ok(handle.to_string()),
        }
    }
}
