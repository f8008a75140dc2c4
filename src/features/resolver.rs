// Platform resolver
// Sequential platform fallback through the caches and the upstream source

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::tracker::StatsSource;
use crate::features::archive::ArchivalStore;
use crate::features::errors::StatsError;
use crate::features::stats_cache::VolatileStatsCache;
use crate::models::mode::SeasonView;
use crate::models::platform::Platform;
use crate::models::player::PlayerRecord;

pub struct PlatformResolver {
    source: Arc<dyn StatsSource>,
    cache: Arc<VolatileStatsCache>,
    archive: ArchivalStore,
}

impl PlatformResolver {
    pub fn new(
        source: Arc<dyn StatsSource>,
        cache: Arc<VolatileStatsCache>,
        archive: ArchivalStore,
    ) -> Self {
        Self {
            source,
            cache,
            archive,
        }
    }

    /// Find the record for `handle`, trying `platforms` in order.
    ///
    /// Archived seasons skip the platforms entirely. Otherwise the first
    /// platform that answers wins and only the last failure is reported.
    pub async fn resolve(
        &self,
        handle: &str,
        platforms: &[Platform],
        season: SeasonView,
    ) -> Result<Arc<PlayerRecord>, StatsError> {
        if season.is_archived() {
            return match self.archive.lookup(handle).await? {
                Some(record) => Ok(Arc::new(record)),
                None => Err(StatsError::Deprecated),
            };
        }

        let mut last_err = StatsError::NotFound {
            handles: vec![handle.to_string()],
        };

        for (i, &platform) in platforms.iter().enumerate() {
            if let Some(record) = self.cache.get(platform, handle) {
                return Ok(record);
            }

            match self.source.get(handle, platform, true).await {
                Ok(record) => {
                    info!(handle, %platform, "Fetched stats from upstream");
                    let record = Arc::new(record);
                    self.cache.insert(platform, handle, Arc::clone(&record));
                    return Ok(record);
                }
                Err(e) => {
                    let remaining = platforms.len() - i - 1;
                    warn!(handle, %platform, error = %e, remaining, "Platform lookup failed");
                    last_err = StatsError::from_source(e, handle);
                }
            }
        }

        Err(last_err)
    }

    /// Upstream source, for follow-up calls keyed by account id
    pub fn source(&self) -> &Arc<dyn StatsSource> {
        &self.source
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::store::{KeyValueStore, MemoryStore};
    use crate::api::tracker::SourceError;
    use crate::features::archive::archive_key;
    use crate::features::stats_cache::tests::record;
    use crate::models::player::MatchRecord;
    use crate::utils::clock::SystemClock;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted upstream that records every call
    #[derive(Default)]
    pub(crate) struct StubSource {
        pub responses: HashMap<(String, Platform), Result<PlayerRecord, SourceError>>,
        pub matches: Vec<MatchRecord>,
        pub calls: Mutex<Vec<(String, Platform)>>,
    }

    impl StubSource {
        pub fn with(mut self, handle: &str, platform: Platform, r: Result<PlayerRecord, SourceError>) -> Self {
            self.responses.insert((handle.to_lowercase(), platform), r);
            self
        }

        pub fn calls(&self) -> Vec<(String, Platform)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatsSource for StubSource {
        async fn get(
            &self,
            handle: &str,
            platform: Platform,
            _include_modes: bool,
        ) -> Result<PlayerRecord, SourceError> {
            self.calls.lock().unwrap().push((handle.to_string(), platform));
            self.responses
                .get(&(handle.to_lowercase(), platform))
                .cloned()
                .unwrap_or(Err(SourceError::NotFound))
        }

        async fn get_matches(&self, _account_id: &str) -> Result<Vec<MatchRecord>, SourceError> {
            Ok(self.matches.clone())
        }
    }

    pub(crate) fn resolver_with(
        source: Arc<StubSource>,
        store: Arc<MemoryStore>,
    ) -> PlatformResolver {
        let cache = Arc::new(VolatileStatsCache::new(
            Duration::from_secs(300),
            Arc::new(SystemClock),
        ));
        PlatformResolver::new(source, cache, ArchivalStore::new(store))
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let source = Arc::new(
            StubSource::default().with("ninja", Platform::Pc, Ok(record("Ninja", Platform::Pc))),
        );
        let resolver = resolver_with(source.clone(), Arc::new(MemoryStore::new()));

        let r = resolver
            .resolve("ninja", &Platform::ALL, SeasonView::Lifetime)
            .await
            .unwrap();

        assert_eq!(r.platform, Platform::Pc);
        assert_eq!(source.calls(), vec![("ninja".to_string(), Platform::Pc)]);
    }

    #[tokio::test]
    async fn test_earlier_failure_hidden_by_later_success() {
        let source = Arc::new(
            StubSource::default()
                .with("ninja", Platform::Pc, Err(SourceError::Unavailable))
                .with("ninja", Platform::Xbox, Ok(record("Ninja", Platform::Xbox))),
        );
        let resolver = resolver_with(source.clone(), Arc::new(MemoryStore::new()));

        let r = resolver
            .resolve("ninja", &Platform::ALL, SeasonView::Lifetime)
            .await
            .unwrap();

        assert_eq!(r.platform, Platform::Xbox);
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_not_found_after_all_attempts() {
        let source = Arc::new(StubSource::default());
        let resolver = resolver_with(source.clone(), Arc::new(MemoryStore::new()));

        let err = resolver
            .resolve("ghost", &Platform::ALL, SeasonView::Lifetime)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "User ghost not found.");
        let tried: Vec<Platform> = source.calls().into_iter().map(|(_, p)| p).collect();
        assert_eq!(tried, Platform::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_last_failure_wins() {
        let source = Arc::new(
            StubSource::default()
                .with("ninja", Platform::Pc, Err(SourceError::NotFound))
                .with("ninja", Platform::Xbox, Err(SourceError::Unavailable)),
        );
        let resolver = resolver_with(source, Arc::new(MemoryStore::new()));

        let err = resolver
            .resolve("ninja", &[Platform::Pc, Platform::Xbox], SeasonView::Lifetime)
            .await
            .unwrap_err();

        assert_eq!(err, StatsError::Unavailable);
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let source = Arc::new(
            StubSource::default().with("ninja", Platform::Ps4, Ok(record("Ninja", Platform::Ps4))),
        );
        let resolver = resolver_with(source.clone(), Arc::new(MemoryStore::new()));

        for _ in 0..2 {
            resolver
                .resolve("Ninja", &[Platform::Ps4], SeasonView::Current)
                .await
                .unwrap();
        }

        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_archived_season_never_calls_upstream() {
        let source = Arc::new(
            StubSource::default().with("ninja", Platform::Pc, Ok(record("Ninja", Platform::Pc))),
        );
        let store = Arc::new(MemoryStore::new());
        let snapshot = record("Ninja", Platform::Pc);
        store
            .set(&archive_key("ninja"), serde_json::to_vec(&snapshot).unwrap())
            .await
            .unwrap();
        let resolver = resolver_with(source.clone(), store);

        let r = resolver
            .resolve("ninja", &Platform::ALL, SeasonView::Archived(5))
            .await
            .unwrap();
        assert_eq!(r.handle, "Ninja");

        let missing = resolver
            .resolve("tfue", &Platform::ALL, SeasonView::Archived(5))
            .await
            .unwrap_err();
        assert_eq!(missing, StatsError::Deprecated);

        assert!(source.calls().is_empty());
    }
}
