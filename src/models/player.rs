// Player data models
// Typed snapshot of one handle on one platform, built at the StatsSource boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::mode::ModeInfo;
use crate::models::platform::Platform;

/// A number upstream has already formatted for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stat {
    pub value: f64,
    pub display: String,
}

impl Stat {
    pub fn new(value: f64, display: impl Into<String>) -> Self {
        Self {
            value,
            display: display.into(),
        }
    }
}

/// Lifetime stat block across all modes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LifetimeStats {
    pub top3: u64,
    pub top5: u64,
    pub top10: u64,
    pub top6: u64,
    pub top12: u64,
    pub top25: u64,
    pub score: String,
    pub matches: u64,
    pub wins: u64,
    /// Upstream formats this with its own `%` sign
    pub win_rate: String,
    pub kills: u64,
    pub kd: String,
}

/// Stats for one mode in one season view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModeStats {
    pub matches: u64,
    pub wins: u64,
    pub top3: u64,
    pub top5: u64,
    pub top6: u64,
    pub top10: u64,
    pub top12: u64,
    pub top25: u64,
    pub kills: u64,
    pub win_ratio: Option<Stat>,
    pub kd: Stat,
    pub trn_rating: Stat,
    pub score: Stat,
    pub score_per_match: Stat,
}

impl ModeStats {
    /// Times placed in the top `bucket`; unknown buckets count as zero
    pub fn top(&self, bucket: u32) -> u64 {
        match bucket {
            1 => self.wins,
            3 => self.top3,
            5 => self.top5,
            6 => self.top6,
            10 => self.top10,
            12 => self.top12,
            25 => self.top25,
            _ => 0,
        }
    }
}

/// One entry of the recent-matches summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentMatch {
    pub playlist: String,
    pub matches: u64,
    pub wins: u64,
    pub kills: u64,
    pub collected_at: DateTime<Utc>,
}

/// Raw per-platform snapshot for one handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub account_id: String,
    /// Handle with upstream's capitalisation
    pub handle: String,
    pub platform: Platform,
    pub lifetime: LifetimeStats,
    /// Mode blocks keyed by registry id (`p2`, `curr_p10`, `s5_p9`, ...)
    #[serde(default)]
    pub modes: HashMap<String, ModeStats>,
    #[serde(default)]
    pub recent_matches: Vec<RecentMatch>,
}

impl PlayerRecord {
    pub fn mode(&self, info: &ModeInfo) -> Option<&ModeStats> {
        self.modes.get(&info.id)
    }
}

/// Match history entry from the account matches endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub playlist: String,
    pub matches: u64,
    pub wins: u64,
    pub kills: u64,
    pub trn_rating_change: f64,
    pub collected_at: DateTime<Utc>,
}

/// Item in the daily/weekly store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreItem {
    pub name: String,
    pub rarity: String,
    pub category: String,
    pub vbucks: u64,
}

/// Weekly challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub name: String,
    pub total: u64,
    pub reward: u64,
}

/// Row of the tracker leaderboard page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: String,
    pub player: String,
    pub value: String,
}
