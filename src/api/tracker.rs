// Fortnite Tracker API client
// Upstream stats source. Raw JSON is mapped to typed records and upstream
// failures are classified here, nowhere else.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::leaderboards::parse_leaderboard;
use crate::models::platform::Platform;
use crate::models::player::{
    Challenge, LeaderboardEntry, LifetimeStats, MatchRecord, ModeStats, PlayerRecord, RecentMatch,
    Stat, StoreItem,
};
use crate::utils::config::{LEADERBOARDS_URL, TRACKER_API_BASE};

/// Classified upstream failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Player not found")]
    NotFound,
    #[error("Tracker API unavailable")]
    Unavailable,
    #[error("Tracker API error: {0}")]
    Other(String),
}

/// Upstream player stats
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn get(
        &self,
        handle: &str,
        platform: Platform,
        include_modes: bool,
    ) -> Result<PlayerRecord, SourceError>;

    async fn get_matches(&self, account_id: &str) -> Result<Vec<MatchRecord>, SourceError>;
}

/// Upstream data that is not tied to a player
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn store(&self) -> Result<Vec<StoreItem>, SourceError>;
    async fn challenges(&self) -> Result<Vec<Challenge>, SourceError>;
    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, SourceError>;
}

/// Tracker REST client
pub struct TrackerClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TrackerClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: TRACKER_API_BASE.to_string(),
        }
    }

    /// GET a JSON document from the API, classifying failures
    async fn get_json(&self, path: &str) -> Result<Value, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header("TRN-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if let Some(err) = classify_status(status) {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %body, "Tracker API error");
            return Err(err);
        }

        let body: Value = response.json().await.map_err(classify_transport)?;
        if let Some(err) = classify_body(&body) {
            return Err(err);
        }
        Ok(body)
    }
}

#[async_trait]
impl StatsSource for TrackerClient {
    async fn get(
        &self,
        handle: &str,
        platform: Platform,
        include_modes: bool,
    ) -> Result<PlayerRecord, SourceError> {
        let path = format!(
            "/profile/{}/{}",
            platform.api_name(),
            urlencoding::encode(handle)
        );
        let body = self.get_json(&path).await?;
        let profile: ApiProfile =
            serde_json::from_value(body).map_err(|e| SourceError::Other(e.to_string()))?;

        Ok(map_profile(profile, platform, include_modes))
    }

    async fn get_matches(&self, account_id: &str) -> Result<Vec<MatchRecord>, SourceError> {
        let path = format!(
            "/profile/account/{}/matches",
            urlencoding::encode(account_id)
        );
        let body = self.get_json(&path).await?;
        let matches: Vec<ApiMatch> =
            serde_json::from_value(body).map_err(|e| SourceError::Other(e.to_string()))?;

        Ok(matches.into_iter().filter_map(map_match).collect())
    }
}

#[async_trait]
impl CatalogSource for TrackerClient {
    async fn store(&self) -> Result<Vec<StoreItem>, SourceError> {
        let body = self.get_json("/store").await?;
        let items: Vec<ApiStoreItem> =
            serde_json::from_value(body).map_err(|e| SourceError::Other(e.to_string()))?;

        Ok(items
            .into_iter()
            .map(|i| StoreItem {
                name: i.name,
                rarity: i.rarity,
                category: i.store_category,
                vbucks: i.vbucks,
            })
            .collect())
    }

    async fn challenges(&self) -> Result<Vec<Challenge>, SourceError> {
        let body = self.get_json("/challenges").await?;
        let list: ApiChallenges =
            serde_json::from_value(body).map_err(|e| SourceError::Other(e.to_string()))?;

        Ok(list.items.iter().map(map_challenge).collect())
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, SourceError> {
        let response = self
            .client
            .get(LEADERBOARDS_URL)
            .send()
            .await
            .map_err(classify_transport)?;

        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }

        let html = response.text().await.map_err(classify_transport)?;
        Ok(parse_leaderboard(&html))
    }
}

// ============ Classification ============

fn classify_status(status: StatusCode) -> Option<SourceError> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND {
        Some(SourceError::NotFound)
    } else if status == StatusCode::SERVICE_UNAVAILABLE {
        Some(SourceError::Unavailable)
    } else {
        Some(SourceError::Other(format!("HTTP {}", status)))
    }
}

/// The API reports some failures with a 200 and an `error` field
fn classify_body(body: &Value) -> Option<SourceError> {
    match body.get("error").and_then(|e| e.as_str()) {
        Some("Player Not Found") => Some(SourceError::NotFound),
        Some(other) => Some(SourceError::Other(other.to_string())),
        None => None,
    }
}

fn classify_transport(err: reqwest::Error) -> SourceError {
    if err.is_timeout() || err.is_connect() {
        SourceError::Unavailable
    } else {
        SourceError::Other(err.to_string())
    }
}

// ============ Mapping ============

/// Upstream numbers arrive as `"1,064"`, `"38.7%"` or plain numbers
fn parse_count(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    digits.parse::<f64>().map(|v| v as u64).unwrap_or(0)
}

fn parse_tracker_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn map_lifetime(entries: &[ApiKeyValue]) -> LifetimeStats {
    let raw = |i: usize| entries.get(i).map(|e| e.value.as_str()).unwrap_or("0");

    LifetimeStats {
        top3: parse_count(raw(0)),
        top5: parse_count(raw(1)),
        top10: parse_count(raw(2)),
        top6: parse_count(raw(3)),
        top12: parse_count(raw(4)),
        top25: parse_count(raw(5)),
        score: raw(6).to_string(),
        matches: parse_count(raw(7)),
        wins: parse_count(raw(8)),
        win_rate: raw(9).to_string(),
        kills: parse_count(raw(10)),
        kd: raw(11).to_string(),
    }
}

fn map_mode(fields: &HashMap<String, ApiStat>) -> ModeStats {
    let count = |name: &str| fields.get(name).map(ApiStat::count).unwrap_or(0);
    let stat = |name: &str| fields.get(name).map(ApiStat::to_stat).unwrap_or_default();

    ModeStats {
        matches: count("matches"),
        wins: count("top1"),
        top3: count("top3"),
        top5: count("top5"),
        top6: count("top6"),
        top10: count("top10"),
        top12: count("top12"),
        top25: count("top25"),
        kills: count("kills"),
        win_ratio: fields.get("winRatio").map(ApiStat::to_stat),
        kd: stat("kd"),
        trn_rating: stat("trnRating"),
        score: stat("score"),
        score_per_match: stat("scorePerMatch"),
    }
}

fn map_profile(profile: ApiProfile, platform: Platform, include_modes: bool) -> PlayerRecord {
    let modes = if include_modes {
        profile
            .stats
            .iter()
            .map(|(id, fields)| (id.clone(), map_mode(fields)))
            .collect()
    } else {
        HashMap::new()
    };

    let recent_matches = profile
        .recent_matches
        .into_iter()
        .filter_map(|m| {
            let collected_at = parse_tracker_date(&m.date_collected)?;
            Some(RecentMatch {
                playlist: m.playlist,
                matches: m.matches,
                wins: m.top1,
                kills: m.kills,
                collected_at,
            })
        })
        .collect();

    PlayerRecord {
        account_id: profile.account_id,
        handle: profile.epic_user_handle,
        platform,
        lifetime: map_lifetime(&profile.lifetime_stats),
        modes,
        recent_matches,
    }
}

fn map_match(m: ApiMatch) -> Option<MatchRecord> {
    let collected_at = match parse_tracker_date(&m.date_collected) {
        Some(dt) => dt,
        None => {
            warn!(date = %m.date_collected, "Skipping match with unparseable date");
            return None;
        }
    };

    Some(MatchRecord {
        playlist: m.playlist,
        matches: m.matches,
        wins: m.top1,
        kills: m.kills,
        trn_rating_change: m.trn_rating_change,
        collected_at,
    })
}

fn map_challenge(item: &ApiChallengeItem) -> Challenge {
    let meta = |key: &str| {
        item.metadata
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| kv.value.clone())
            .unwrap_or_default()
    };

    Challenge {
        name: meta("name"),
        total: parse_count(&meta("questsTotal")),
        reward: parse_count(&meta("reward")),
    }
}

// Request/Response structures
#[derive(Debug, Deserialize)]
struct ApiProfile {
    #[serde(rename = "accountId", default)]
    account_id: String,
    #[serde(rename = "epicUserHandle", default)]
    epic_user_handle: String,
    #[serde(default)]
    stats: HashMap<String, HashMap<String, ApiStat>>,
    #[serde(rename = "lifeTimeStats", default)]
    lifetime_stats: Vec<ApiKeyValue>,
    #[serde(rename = "recentMatches", default)]
    recent_matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiStat {
    #[serde(default)]
    value: Option<Value>,
    #[serde(rename = "valueInt")]
    value_int: Option<i64>,
    #[serde(rename = "valueDec")]
    value_dec: Option<f64>,
    #[serde(rename = "displayValue")]
    display_value: Option<String>,
}

impl ApiStat {
    fn raw_value(&self) -> String {
        match &self.value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    fn count(&self) -> u64 {
        match self.value_int {
            Some(v) => v.max(0) as u64,
            None => parse_count(&self.raw_value()),
        }
    }

    fn to_stat(&self) -> Stat {
        let value = self
            .value_dec
            .or(self.value_int.map(|v| v as f64))
            .or_else(|| self.raw_value().replace(',', "").parse().ok())
            .unwrap_or(0.0);
        let display = self
            .display_value
            .clone()
            .unwrap_or_else(|| self.raw_value());
        Stat::new(value, display)
    }
}

#[derive(Debug, Deserialize)]
struct ApiKeyValue {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ApiMatch {
    #[serde(default)]
    playlist: String,
    #[serde(default)]
    matches: u64,
    #[serde(default)]
    top1: u64,
    #[serde(default)]
    kills: u64,
    #[serde(rename = "trnRatingChange", default)]
    trn_rating_change: f64,
    #[serde(rename = "dateCollected", default)]
    date_collected: String,
}

#[derive(Debug, Deserialize)]
struct ApiStoreItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    rarity: String,
    #[serde(rename = "storeCategory", default)]
    store_category: String,
    #[serde(rename = "vBucks", default)]
    vbucks: u64,
}

#[derive(Debug, Deserialize)]
struct ApiChallenges {
    #[serde(default)]
    items: Vec<ApiChallengeItem>,
}

#[derive(Debug, Deserialize)]
struct ApiChallengeItem {
    #[serde(default)]
    metadata: Vec<ApiKeyValue>,
}
