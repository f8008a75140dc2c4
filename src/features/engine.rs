// Stats engine
// One inbound chat message in, at most one reply out

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::tracker::{CatalogSource, SourceError};
use crate::features::command_parser::{self, HandleRef, Intent, ParseOutcome, ReportKind, Subject};
use crate::features::errors::StatsError;
use crate::features::identity::IdentityCache;
use crate::features::report;
use crate::features::resolver::PlatformResolver;
use crate::features::sink::{MessageSink, Reply, SinkError, Target};
use crate::models::mode::{mode_info, SeasonView};
use crate::models::platform::Platform;
use crate::models::player::PlayerRecord;
use crate::utils::clock::Clock;
use crate::utils::config::help_text;

pub struct StatsEngine {
    resolver: PlatformResolver,
    identity: IdentityCache,
    catalog: Arc<dyn CatalogSource>,
    sink: Arc<dyn MessageSink>,
    clock: Arc<dyn Clock>,
    prefix: String,
}

fn table((intro, columns): (String, report::Table)) -> Reply {
    Reply::Table { intro, columns }
}

/// Catalog failures are not about a player, so `NotFound` is just an upstream error
fn catalog_error(err: SourceError) -> StatsError {
    match err {
        SourceError::Unavailable => StatsError::Unavailable,
        other => StatsError::Upstream(other.to_string()),
    }
}

impl StatsEngine {
    pub fn new(
        resolver: PlatformResolver,
        identity: IdentityCache,
        catalog: Arc<dyn CatalogSource>,
        sink: Arc<dyn MessageSink>,
        clock: Arc<dyn Clock>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            identity,
            catalog,
            sink,
            clock,
            prefix: prefix.into(),
        }
    }

    /// Parse, resolve, format and send. Only sink failures escape.
    pub async fn handle_message(
        &self,
        text: &str,
        account_id: &str,
        target: &Target,
    ) -> Result<(), SinkError> {
        let intent = match command_parser::parse(text, account_id, &self.prefix) {
            ParseOutcome::NoMatch => return Ok(()),
            ParseOutcome::Deprecated => {
                return self
                    .deliver(target, Reply::Text(StatsError::Deprecated.user_message()))
                    .await
            }
            ParseOutcome::Intent(intent) => intent,
        };

        debug!(kind = ?intent.kind, platform = ?intent.platform, season = ?intent.season, "Parsed command");

        match self.build_reply(&intent).await {
            Ok(reply) => self.deliver(target, reply).await,
            Err(StatsError::NotMapped) => {
                // No handle given and none remembered: stay silent
                debug!(account_id, "Dropping command without a handle");
                Ok(())
            }
            Err(e) => {
                info!(kind = ?intent.kind, error = %e, "Command failed");
                self.deliver(target, Reply::Text(e.user_message())).await
            }
        }
    }

    async fn build_reply(&self, intent: &Intent) -> Result<Reply, StatsError> {
        let handle = match (&intent.kind, &intent.subject) {
            (ReportKind::Help, _) => return Ok(Reply::Text(help_text())),
            (ReportKind::Store, _) => {
                let items = self.catalog.store().await.map_err(catalog_error)?;
                return Ok(table(report::write_store(&items)));
            }
            (ReportKind::Challenges, _) => {
                let items = self.catalog.challenges().await.map_err(catalog_error)?;
                return Ok(table(report::write_challenges(&items)));
            }
            (ReportKind::Leaderboards, _) => {
                let entries = self.catalog.leaderboard().await.map_err(catalog_error)?;
                return Ok(table(report::write_leaderboards(&entries)));
            }
            (ReportKind::Compare, Subject::Pair(a, b)) => {
                let a = self.identity.expand(&intent.account_id, a).await?;
                let b = self.identity.expand(&intent.account_id, b).await?;
                return self.compare(&a, &b, &intent.platform.platforms()).await;
            }
            (ReportKind::Set, Subject::Player(HandleRef::Given(h))) => {
                self.identity.remember(&intent.account_id, h).await?;
                return Ok(Reply::Text(format!("Username {} saved.", h)));
            }
            (ReportKind::Nick, Subject::Pair(nick, h)) => {
                self.identity.remember_nick(&intent.account_id, nick, h).await?;
                return Ok(Reply::Text(format!("Nickname {} saved for {}.", nick, h)));
            }
            (ReportKind::DeleteNick, Subject::Player(HandleRef::Given(nick))) => {
                let text = if self.identity.forget_nick(&intent.account_id, nick).await? {
                    format!("Nickname {} deleted.", nick)
                } else {
                    format!("Nickname {} not found.", nick)
                };
                return Ok(Reply::Text(text));
            }
            (_, Subject::Player(HandleRef::Given(h))) => {
                self.identity.expand(&intent.account_id, h).await?
            }
            (_, Subject::Player(HandleRef::Remembered)) => {
                self.identity.recall(&intent.account_id).await?
            }
            (_, _) => return Err(StatsError::NotMapped),
        };

        let record = self
            .resolver
            .resolve(&handle, &intent.platform.platforms(), intent.season)
            .await?;

        self.format(intent, &handle, &record).await
    }

    async fn format(
        &self,
        intent: &Intent,
        handle: &str,
        record: &PlayerRecord,
    ) -> Result<Reply, StatsError> {
        let now = self.clock.now();

        let reply = match intent.kind {
            ReportKind::Global => Reply::Text(report::write_global(record)),
            ReportKind::Mode(base) => {
                Reply::Text(report::write_modes(record, &mode_info(base, intent.season))?)
            }
            ReportKind::Season => Reply::Text(report::write_season(record, intent.season)),
            ReportKind::Recent => table(report::write_recent(record, now)?),
            ReportKind::RecentLegacy => Reply::Text(report::write_recent_legacy(record, now)?),
            ReportKind::Rating => Reply::Text(report::write_rating(record)),
            ReportKind::Kd => Reply::Text(report::write_kd(record)),
            ReportKind::Winrate => Reply::Text(report::write_winrate(record)),
            ReportKind::Matches => {
                let history = self
                    .resolver
                    .source()
                    .get_matches(&record.account_id)
                    .await
                    .map_err(|e| StatsError::from_source(e, handle))?;
                table(report::write_matches(record, &history, now)?)
            }
            // Answered before any lookup
            ReportKind::Help
            | ReportKind::Store
            | ReportKind::Challenges
            | ReportKind::Leaderboards
            | ReportKind::Compare
            | ReportKind::Set
            | ReportKind::Nick
            | ReportKind::DeleteNick => {
                return Err(StatsError::Upstream(format!(
                    "{:?} does not take a player",
                    intent.kind
                )))
            }
        };

        Ok(reply)
    }

    /// Both players must be found on the same platform
    async fn compare(&self, a: &str, b: &str, platforms: &[Platform]) -> Result<Reply, StatsError> {
        let both_missing = |e: StatsError| match e {
            StatsError::NotFound { .. } => StatsError::NotFound {
                handles: vec![a.to_string(), b.to_string()],
            },
            other => other,
        };

        let mut last_err = both_missing(StatsError::NotFound { handles: Vec::new() });
        for &platform in platforms {
            let first = match self.resolver.resolve(a, &[platform], SeasonView::Lifetime).await {
                Ok(record) => record,
                Err(e) => {
                    last_err = both_missing(e);
                    continue;
                }
            };
            match self.resolver.resolve(b, &[platform], SeasonView::Lifetime).await {
                Ok(second) => return Ok(table(report::write_compare(&first, &second))),
                Err(e) => {
                    debug!(%platform, first = a, second = b, "Compare pair not on one platform");
                    last_err = both_missing(e);
                }
            }
        }

        Err(last_err)
    }

    /// Send, retrying once in plain text if the sink cannot render the markup
    async fn deliver(&self, target: &Target, reply: Reply) -> Result<(), SinkError> {
        match self.sink.send(target, reply.clone()).await {
            Err(SinkError::Rendering(reason)) => {
                warn!(%reason, "Reply could not be rendered, sending plain fallback");
                self.sink.send(target, reply.plain_fallback()).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::store::MemoryStore;
    use crate::features::resolver::tests::{resolver_with, StubSource};
    use crate::features::sink::tests::RecordingSink;
    use crate::features::sink::MARKDOWN_FALLBACK;
    use crate::features::stats_cache::tests::record;
    use crate::models::player::{Challenge, LeaderboardEntry, ModeStats, RecentMatch, StoreItem};
    use crate::utils::clock::SystemClock;
    use async_trait::async_trait;

    struct StubCatalog;

    #[async_trait]
    impl CatalogSource for StubCatalog {
        async fn store(&self) -> Result<Vec<StoreItem>, SourceError> {
            Ok(vec![StoreItem {
                name: "Raven".to_string(),
                rarity: "Legendary".to_string(),
                category: "Outfit".to_string(),
                vbucks: 2000,
            }])
        }

        async fn challenges(&self) -> Result<Vec<Challenge>, SourceError> {
            Ok(Vec::new())
        }

        async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, SourceError> {
            Err(SourceError::Unavailable)
        }
    }

    const TARGET: Target = Target {
        channel_id: 1,
        author_id: 2,
    };

    fn engine(source: Arc<StubSource>, sink: Arc<RecordingSink>) -> StatsEngine {
        let store = Arc::new(MemoryStore::new());
        StatsEngine::new(
            resolver_with(source, store.clone()),
            IdentityCache::new(store),
            Arc::new(StubCatalog),
            sink,
            Arc::new(SystemClock),
            "/",
        )
    }

    fn ninja() -> PlayerRecord {
        let mut r = record("Ninja", Platform::Pc);
        r.lifetime.matches = 100;
        r.lifetime.wins = 10;
        r.lifetime.kills = 250;
        r.lifetime.win_rate = "10%".to_string();
        r
    }

    fn texts(sink: &RecordingSink) -> Vec<String> {
        sink.sent()
            .into_iter()
            .map(|r| match r {
                Reply::Text(t) => t,
                Reply::Table { intro, .. } => intro,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_global_report() {
        let source = Arc::new(StubSource::default().with("ninja", Platform::Pc, Ok(ninja())));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source, sink.clone());

        engine.handle_message("/user Ninja", "acct", &TARGET).await.unwrap();

        let sent = texts(&sink);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Win Rate: 10%\n"));
        assert!(sent[0].contains("Kills/Game: 2.50\n"));
    }

    #[tokio::test]
    async fn test_chatter_is_ignored() {
        let source = Arc::new(StubSource::default());
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source.clone(), sink.clone());

        engine.handle_message("gg everyone", "acct", &TARGET).await.unwrap();

        assert!(sink.sent().is_empty());
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_identity_is_silent() {
        let source = Arc::new(StubSource::default());
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source.clone(), sink.clone());

        engine.handle_message("/solo", "acct", &TARGET).await.unwrap();

        assert!(sink.sent().is_empty());
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_set_then_use_remembered_handle() {
        let source = Arc::new(StubSource::default().with("ninja", Platform::Pc, Ok(ninja())));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source, sink.clone());

        engine.handle_message("/set Ninja", "acct", &TARGET).await.unwrap();
        engine.handle_message("/user", "acct", &TARGET).await.unwrap();

        let sent = texts(&sink);
        assert_eq!(sent[0], "Username ninja saved.");
        assert!(sent[1].starts_with("Lifetime stats for Ninja:"));
    }

    #[tokio::test]
    async fn test_unsupported_season_is_deprecated() {
        let source = Arc::new(StubSource::default());
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source.clone(), sink.clone());

        engine.handle_message("/s1 ninja", "acct", &TARGET).await.unwrap();

        assert_eq!(texts(&sink), vec!["Deprecated command."]);
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_after_every_platform() {
        let source = Arc::new(StubSource::default());
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source.clone(), sink.clone());

        engine.handle_message("/user ghost", "acct", &TARGET).await.unwrap();

        assert_eq!(texts(&sink), vec!["User ghost not found."]);
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_pinned_platform_skips_fallback() {
        let source = Arc::new(StubSource::default().with("ninja", Platform::Pc, Ok(ninja())));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source.clone(), sink.clone());

        engine.handle_message("/xbox ninja", "acct", &TARGET).await.unwrap();

        assert_eq!(texts(&sink), vec!["User ninja not found."]);
        assert_eq!(source.calls(), vec![("ninja".to_string(), Platform::Xbox)]);
    }

    #[tokio::test]
    async fn test_mode_never_played() {
        let source = Arc::new(StubSource::default().with("ninja", Platform::Pc, Ok(ninja())));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source, sink.clone());

        engine.handle_message("/solo ninja", "acct", &TARGET).await.unwrap();

        assert_eq!(texts(&sink), vec!["User Ninja has never played Solo."]);
    }

    #[tokio::test]
    async fn test_compare() {
        let mut tfue = record("Tfue", Platform::Pc);
        tfue.modes.insert(
            "p9".to_string(),
            ModeStats {
                matches: 5,
                ..Default::default()
            },
        );
        let source = Arc::new(
            StubSource::default()
                .with("ninja", Platform::Pc, Ok(ninja()))
                .with("tfue", Platform::Pc, Ok(tfue)),
        );
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source, sink.clone());

        engine
            .handle_message("/compare ninja, tfue", "acct", &TARGET)
            .await
            .unwrap();
        engine
            .handle_message("/compare ninja, ghost", "acct", &TARGET)
            .await
            .unwrap();

        let sent = sink.sent();
        match &sent[0] {
            Reply::Table { intro, columns } => {
                assert!(intro.starts_with("Ninja vs Tfue\n"));
                assert_eq!(columns.len(), 3);
                assert!(columns.iter().all(|c| c.len() == 22));
            }
            other => panic!("expected table, got {:?}", other),
        }
        assert_eq!(sent[1], Reply::Text("User ninja or ghost not found.".to_string()));
    }

    #[tokio::test]
    async fn test_compare_needs_one_shared_platform() {
        let source = Arc::new(
            StubSource::default()
                .with("ninja", Platform::Pc, Ok(ninja()))
                .with("tfue", Platform::Xbox, Ok(record("Tfue", Platform::Xbox))),
        );
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source, sink.clone());

        engine
            .handle_message("/compare ninja, tfue", "acct", &TARGET)
            .await
            .unwrap();

        assert_eq!(texts(&sink), vec!["User ninja or tfue not found."]);
    }

    #[tokio::test]
    async fn test_compare_falls_through_to_later_platform() {
        let source = Arc::new(
            StubSource::default()
                .with("ninja", Platform::Pc, Ok(ninja()))
                .with("ninja", Platform::Xbox, Ok(record("Ninja", Platform::Xbox)))
                .with("tfue", Platform::Xbox, Ok(record("Tfue", Platform::Xbox))),
        );
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source.clone(), sink.clone());

        engine
            .handle_message("/compare ninja, tfue", "acct", &TARGET)
            .await
            .unwrap();

        match &sink.sent()[0] {
            Reply::Table { intro, .. } => assert!(intro.starts_with("Ninja vs Tfue\n")),
            other => panic!("expected table, got {:?}", other),
        }
        assert!(source.calls().contains(&("tfue".to_string(), Platform::Xbox)));
    }

    #[tokio::test]
    async fn test_nickname_lifecycle() {
        let source = Arc::new(StubSource::default().with("ninja", Platform::Pc, Ok(ninja())));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source.clone(), sink.clone());

        engine.handle_message("/nick bob, Ninja", "acct", &TARGET).await.unwrap();
        engine.handle_message("/user bob", "acct", &TARGET).await.unwrap();
        engine.handle_message("/user bob", "other", &TARGET).await.unwrap();
        engine.handle_message("/deletenick bob", "acct", &TARGET).await.unwrap();
        engine.handle_message("/deletenick bob", "acct", &TARGET).await.unwrap();

        let sent = texts(&sink);
        assert_eq!(sent[0], "Nickname bob saved for ninja.");
        assert!(sent[1].starts_with("Lifetime stats for Ninja:"));
        assert_eq!(sent[2], "User bob not found.");
        assert_eq!(sent[3], "Nickname bob deleted.");
        assert_eq!(sent[4], "Nickname bob not found.");
        assert_eq!(source.calls()[0], ("ninja".to_string(), Platform::Pc));
    }

    #[tokio::test]
    async fn test_rendering_failure_falls_back_to_plain_text() {
        let mut r = ninja();
        r.recent_matches.push(RecentMatch {
            playlist: "p2".to_string(),
            matches: 1,
            wins: 1,
            kills: 4,
            collected_at: chrono::Utc::now(),
        });
        let source = Arc::new(StubSource::default().with("ninja", Platform::Pc, Ok(r)));

        let sink = Arc::new(RecordingSink::rejecting(1));
        let engine_a = engine(source.clone(), sink.clone());
        engine_a.handle_message("/recent ninja", "acct", &TARGET).await.unwrap();
        assert_eq!(
            texts(&sink),
            vec!["Recent matches for Ninja:\nPlatform: PC\nSolo - 1 match - 1 win - 4 kills - 0d ago"]
        );

        let sink = Arc::new(RecordingSink::rejecting(1));
        let engine_b = engine(source, sink.clone());
        engine_b.handle_message("/user ninja", "acct", &TARGET).await.unwrap();
        assert_eq!(texts(&sink), vec![MARKDOWN_FALLBACK]);
    }

    #[tokio::test]
    async fn test_catalog_commands() {
        let source = Arc::new(StubSource::default());
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source, sink.clone());

        engine.handle_message("/store", "acct", &TARGET).await.unwrap();
        engine.handle_message("/leaderboards", "acct", &TARGET).await.unwrap();
        engine.handle_message("/help", "acct", &TARGET).await.unwrap();
        engine.handle_message("/storepc", "acct", &TARGET).await.unwrap();
        engine.handle_message("/helpxbox", "acct", &TARGET).await.unwrap();

        let sent = texts(&sink);
        assert_eq!(sent[0], "Current store items:");
        assert_eq!(sent[1], "Fortnite Tracker API is unavailable.");
        assert!(sent[2].starts_with("/user <username>"));
        assert_eq!(sent[3], "Current store items:");
        assert_eq!(sent[4], sent[2]);
    }

    #[tokio::test]
    async fn test_matches_uses_account_history() {
        let source = Arc::new(StubSource::default().with("ninja", Platform::Pc, Ok(ninja())));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(source, sink.clone());

        engine.handle_message("/matches ninja", "acct", &TARGET).await.unwrap();

        // Stub has no history
        assert_eq!(texts(&sink), vec!["User Ninja has no recent matches."]);
    }
}
