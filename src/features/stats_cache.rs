// Volatile stats cache
// Short-lived, process-wide cache of upstream records keyed by (platform, handle)

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::platform::Platform;
use crate::models::player::PlayerRecord;
use crate::utils::clock::Clock;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    platform: Platform,
    handle: String,
}

impl CacheKey {
    fn new(platform: Platform, handle: &str) -> Self {
        Self {
            platform,
            handle: handle.to_lowercase(),
        }
    }
}

struct CacheEntry {
    record: Arc<PlayerRecord>,
    created_at: DateTime<Utc>,
}

pub struct VolatileStatsCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl VolatileStatsCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Cached record, if present and younger than the TTL
    pub fn get(&self, platform: Platform, handle: &str) -> Option<Arc<PlayerRecord>> {
        let key = CacheKey::new(platform, handle);
        let entry = self.entries.get(&key)?;

        if self.is_expired(entry.created_at) {
            debug!(handle, %platform, "Cache entry expired");
            return None;
        }

        debug!(handle, %platform, "Cache hit");
        Some(Arc::clone(&entry.record))
    }

    /// Store a freshly fetched record. Last writer wins.
    pub fn insert(&self, platform: Platform, handle: &str, record: Arc<PlayerRecord>) {
        debug!(handle, %platform, "Caching record");
        self.entries.insert(
            CacheKey::new(platform, handle),
            CacheEntry {
                record,
                created_at: self.clock.now(),
            },
        );
    }

    /// Drop every partition. Returns how many entries were discarded.
    pub fn reset(&self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Clear the whole cache on a fixed interval for as long as the process runs
    pub fn spawn_reset_task(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        // tokio rejects a zero period
        let every = if every.is_zero() {
            warn!("Zero cache reset interval, using one second");
            Duration::from_secs(1)
        } else {
            every
        };
        info!(interval_secs = every.as_secs(), "Starting stats cache reset task");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // First tick fires immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let cleared = cache.reset();
                info!(cleared, at = %cache.clock.now(), "Stats cache reset");
            }
        })
    }

    fn is_expired(&self, created_at: DateTime<Utc>) -> bool {
        match (self.clock.now() - created_at).to_std() {
            Ok(age) => age > self.ttl,
            // Clock moved backwards
            Err(_) => false,
        }
    }
}
