// Centralized configuration for the stats bot

use anyhow::{Context as _, Result};
use std::env;
use std::time::Duration;

/// Season currently served live by the tracker API
pub const CURR_SEASON: u32 = 9;

/// Oldest season still available from the archival store
pub const FIRST_ARCHIVED_SEASON: u32 = 3;

/// Tracker REST API root
pub const TRACKER_API_BASE: &str = "https://api.fortnitetracker.com/v1";

/// Public profile page root, used for links in reports
pub const PROFILE_URL_BASE: &str = "https://fortnitetracker.com/profile";

/// Leaderboard page scraped for `/leaderboards`
pub const LEADERBOARDS_URL: &str = "https://fortnitetracker.com/leaderboards";

/// Discord rejects messages longer than this
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Discord embed colors
pub mod colors {
    pub const PRIMARY: u32 = 0x761fa1;
}

/// Command guide shown by `/help`, `/info` and `/start`
pub fn help_text() -> String {
    let s = CURR_SEASON;
    let p = CURR_SEASON - 1;
    format!(
        "/user <username> for information on the player
/pc <username> for information on the player on PC platform
/xbox <username> for information on the player on XBOX platform
/ps4 <username> for information on the player on PS4 platform
/season{s} or /s{s} <username> for all season {s} information on the player
/season{p} or /s{p} <username> for all season {p} information on the player
/solo <username> for player's lifetime solo stats
/duo <username> for player's lifetime duo stats
/squad <username> for player's lifetime squad stats
/solos{s} <username> for player's season {s} solo stats
/duos{s} <username> for player's season {s} duo stats
/squads{s} <username> for player's season {s} squad stats
/recent or /rold <username> for player's recent match information
/compare <username1>, <username2> to compare two players
/rating <username> for player's TRN rating stats
/kd <username> for player's K/D ratio stats
/winrate <username> for player's win rate stats
/leaderboards for leaderboard data
/challenges for current weekly challenges
/store for current store items
/matches <username> for match history
/set <username> to save username and not specify username for other commands
/nick <nickname>, <username> to save a nickname for a player
/deletenick <nickname> to delete a saved nickname

You can end any command (except /set, /nick, /deletenick, /pc, /xbox, /ps4, /compare) with pc, xbox, or ps4 to specify the platform to search for the user."
    )
}

/// Runtime settings loaded from the environment
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub tracker_api_key: String,
    pub firebase_key_path: String,
    pub command_prefix: String,
    pub cache_ttl: Duration,
    pub cache_reset_interval: Duration,
}

impl BotConfig {
    /// Read settings from environment variables (after `.env` is loaded)
    pub fn from_env() -> Result<Self> {
        let discord_token = env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?;
        let tracker_api_key =
            env::var("TRACKER_API_KEY").context("TRACKER_API_KEY must be set")?;
        let firebase_key_path =
            env::var("FIREBASE_KEY_PATH").unwrap_or_else(|_| "firebase-key.json".to_string());
        let command_prefix = env::var("COMMAND_PREFIX").unwrap_or_else(|_| "/".to_string());

        Ok(Self {
            discord_token,
            tracker_api_key,
            firebase_key_path,
            command_prefix,
            cache_ttl: secs_var("CACHE_TTL_SECS", 300)?,
            cache_reset_interval: secs_var("CACHE_RESET_SECS", 300)?,
        })
    }
}

fn secs_var(name: &str, default: u64) -> Result<Duration> {
    match env::var(name) {
        Ok(raw) => {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds", name))?;
            anyhow::ensure!(secs > 0, "{} must be greater than zero", name);
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
