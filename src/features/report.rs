// Stats report formatting
// Pure functions from typed records to chat text or column-oriented tables

use chrono::{DateTime, Utc};

use crate::features::errors::StatsError;
use crate::models::mode::{mode_info, BaseMode, ModeInfo, SeasonView};
use crate::models::player::{
    Challenge, LeaderboardEntry, MatchRecord, ModeStats, PlayerRecord, RecentMatch, StoreItem,
};
use crate::utils::config::{LEADERBOARDS_URL, PROFILE_URL_BASE};
use crate::utils::formatters::{
    fixed2, format_seconds, percent_or_zero, plural, ratio_or_zero, truncate,
};

/// Longest name shown in a catalog table cell
const MAX_NAME_LEN: usize = 28;

/// Column-oriented table: one inner list per column, header cell first
pub type Table = Vec<Vec<String>>;

/// Public tracker profile link for a record
pub fn profile_url(record: &PlayerRecord) -> String {
    format!(
        "{}/{}/{}",
        PROFILE_URL_BASE,
        record.platform.api_name(),
        urlencoding::encode(&record.handle)
    )
}

fn intro(title: &str, record: &PlayerRecord) -> String {
    format!(
        "{} for {}:\nPlatform: {}\n",
        title,
        record.handle,
        record.platform.label()
    )
}

fn group_label(view: SeasonView) -> String {
    match view.number() {
        Some(n) => format!("Season {}", n),
        None => "Lifetime".to_string(),
    }
}

fn mode_label(playlist: &str) -> String {
    BaseMode::from_playlist(playlist)
        .map(|m| m.label().to_string())
        .unwrap_or_else(|| playlist.to_string())
}

fn age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    format!("{} ago", format_seconds((now - then).num_seconds(), true))
}

fn mode_summary(label: &str, stats: &ModeStats) -> String {
    format!(
        "\n{label} matches played: {}\n{label} wins: {}\n{label} kills: {}\n",
        stats.matches, stats.wins, stats.kills
    )
}

/// Running totals across the base modes of one season view
#[derive(Debug, Default)]
struct Rollup {
    matches: u64,
    wins: u64,
    kills: u64,
    deaths: f64,
    top_small: u64,
    top_large: u64,
}

impl Rollup {
    fn add(&mut self, stats: &ModeStats) {
        self.matches += stats.matches;
        self.wins += stats.wins;
        self.kills += stats.kills;
        self.top_small += stats.top3 + stats.top5 + stats.top10;
        self.top_large += stats.top6 + stats.top12 + stats.top25;
        // Approximate deaths from upstream's rounded K/D
        if stats.kd.value != 0.0 {
            self.deaths += stats.kills as f64 / stats.kd.value;
        }
    }

    fn kd(&self) -> String {
        let deaths = if self.deaths == 0.0 { 1.0 } else { self.deaths };
        fixed2(self.kills as f64 / deaths)
    }

    fn win_rate(&self) -> String {
        percent_or_zero(self.wins, self.matches)
    }
}

/// Lifetime overview plus a short block for each lifetime mode played
pub fn write_global(record: &PlayerRecord) -> String {
    let s = &record.lifetime;
    let mut res = intro("Lifetime stats", record);
    res.push_str(&profile_url(record));
    res.push_str("\n\n");

    res.push_str(&format!("Matches played: {}\n", s.matches));
    res.push_str(&format!("Wins: {}\n", s.wins));
    res.push_str(&format!("Times in top 3/5/10: {}\n", s.top3 + s.top5 + s.top10));
    res.push_str(&format!("Times in top 6/12/25: {}\n", s.top6 + s.top12 + s.top25));
    res.push_str(&format!("Win Rate: {}\n", s.win_rate));
    res.push_str(&format!("Kills: {}\n", s.kills));
    res.push_str(&format!("K/D Ratio: {}\n", s.kd));
    res.push_str(&format!("Kills/Game: {}\n", ratio_or_zero(s.kills, s.matches)));
    res.push_str(&format!("Score: {}\n", s.score));

    for base in BaseMode::ALL {
        if let Some(stats) = record.mode(&mode_info(base, SeasonView::Lifetime)) {
            res.push_str(&mode_summary(base.label(), stats));
        }
    }

    res
}

/// Detailed report for one mode in one season view
pub fn write_modes(record: &PlayerRecord, info: &ModeInfo) -> Result<String, StatsError> {
    let stats = match record.mode(info) {
        Some(stats) if stats.matches > 0 => stats,
        _ => {
            return Err(StatsError::ModeNotFound {
                handle: record.handle.clone(),
                mode: info.display_name.clone(),
            })
        }
    };

    let mut res = intro(&format!("{} stats", info.display_name), record);
    res.push('\n');
    res.push_str(&format!("Matches played: {}\n", stats.matches));
    res.push_str(&format!("Wins: {}\n", stats.wins));
    for bucket in info.top_buckets {
        let times = stats.top(bucket);
        res.push_str(&format!("Times in top {}: {}\n", bucket, times));
        res.push_str(&format!(
            "Top {} rate: {}%\n",
            bucket,
            percent_or_zero(times, stats.matches)
        ));
    }

    let win_rate = stats
        .win_ratio
        .as_ref()
        .map_or("0", |wr| wr.display.as_str());
    res.push_str(&format!("Win Rate: {}%\n", win_rate));
    res.push_str(&format!("Kills: {}\n", stats.kills));
    res.push_str(&format!("K/D Ratio: {}\n", stats.kd.display));
    res.push_str(&format!("Kills/Game: {}\n", ratio_or_zero(stats.kills, stats.matches)));
    res.push_str(&format!("TRN Rating: {}\n", stats.trn_rating.display));
    res.push_str(&format!("Score: {}\n", stats.score.display));
    res.push_str(&format!("Score/Match: {}\n", stats.score_per_match.display));

    Ok(res)
}

/// Totals over every base mode present for a season, then a block per mode
pub fn write_season(record: &PlayerRecord, season: SeasonView) -> String {
    let mut totals = Rollup::default();
    let mut mode_lines = String::new();

    for base in BaseMode::ALL {
        if let Some(stats) = record.mode(&mode_info(base, season)) {
            totals.add(stats);
            mode_lines.push_str(&mode_summary(base.label(), stats));
        }
    }

    let mut res = intro(&format!("{} stats", group_label(season)), record);
    res.push('\n');
    res.push_str(&format!("Matches played: {}\n", totals.matches));
    res.push_str(&format!("Wins: {}\n", totals.wins));
    res.push_str(&format!("Times in top 3/5/10: {}\n", totals.top_small));
    res.push_str(&format!("Times in top 6/12/25: {}\n", totals.top_large));
    res.push_str(&format!("Win Rate: {}%\n", totals.win_rate()));
    res.push_str(&format!("Kills: {}\n", totals.kills));
    res.push_str(&format!("K/D Ratio: {}\n", totals.kd()));
    res.push_str(&format!(
        "Kills/Game: {}\n",
        ratio_or_zero(totals.kills, totals.matches)
    ));
    res.push_str(&mode_lines);

    res
}

fn recent_or_err(record: &PlayerRecord) -> Result<&[RecentMatch], StatsError> {
    if record.recent_matches.is_empty() {
        return Err(StatsError::NoRecentMatches {
            handle: record.handle.clone(),
        });
    }
    Ok(&record.recent_matches)
}

/// Recent matches as a Mode/Matches/Wins/Kills/Time table
pub fn write_recent(
    record: &PlayerRecord,
    now: DateTime<Utc>,
) -> Result<(String, Table), StatsError> {
    let matches = recent_or_err(record)?;

    let intro = intro("Recent matches", record).trim_end().to_string();
    let mut table: Table = ["Mode", "Matches", "Wins", "Kills", "Time"]
        .iter()
        .map(|h| vec![h.to_string()])
        .collect();

    for m in matches {
        table[0].push(mode_label(&m.playlist));
        table[1].push(plural(m.matches, "match", "matches"));
        table[2].push(plural(m.wins, "win", "wins"));
        table[3].push(plural(m.kills, "kill", "kills"));
        table[4].push(age(now, m.collected_at));
    }

    Ok((intro, table))
}

/// Recent matches, one dash-separated line each
pub fn write_recent_legacy(record: &PlayerRecord, now: DateTime<Utc>) -> Result<String, StatsError> {
    let matches = recent_or_err(record)?;

    let mut res = intro("Recent matches", record);
    res.push('\n');
    for m in matches {
        res.push_str(&format!(
            "{} - {} - {} - {} -{}\n",
            mode_label(&m.playlist),
            plural(m.matches, "match", "matches"),
            plural(m.wins, "win", "wins"),
            plural(m.kills, "kill", "kills"),
            age(now, m.collected_at)
        ));
    }

    Ok(res)
}

const COMPARE_LABELS: [&str; 22] = [
    "User",
    "Matches played",
    "Wins",
    "Times in top 3/5/10",
    "Times in top 6/12/25",
    "Win Rate",
    "Kills",
    "K/D Ratio",
    "Kills/Game",
    "Score",
    "",
    "Solo matches played",
    "Solo wins",
    "Solo kills",
    "",
    "Duo matches played",
    "Duo wins",
    "Duo kills",
    "",
    "Squad matches played",
    "Squad wins",
    "Squad kills",
];

fn compare_column(record: &PlayerRecord) -> Vec<String> {
    let s = &record.lifetime;
    let mut col = vec![
        record.handle.clone(),
        s.matches.to_string(),
        s.wins.to_string(),
        (s.top3 + s.top5 + s.top10).to_string(),
        (s.top6 + s.top12 + s.top25).to_string(),
        s.win_rate.clone(),
        s.kills.to_string(),
        s.kd.clone(),
        ratio_or_zero(s.kills, s.matches),
        s.score.clone(),
    ];

    for base in BaseMode::ALL {
        col.push(String::new());
        match record.mode(&mode_info(base, SeasonView::Lifetime)) {
            Some(m) => col.extend([m.matches, m.wins, m.kills].map(|n| n.to_string())),
            None => col.extend(["0", "0", "0"].map(String::from)),
        }
    }

    col
}

/// Side-by-side lifetime comparison of two records
pub fn write_compare(a: &PlayerRecord, b: &PlayerRecord) -> (String, Table) {
    let intro = format!(
        "{} vs {}\nPlatform: {}\n{}\n{}",
        a.handle,
        b.handle,
        a.platform.label(),
        profile_url(a),
        profile_url(b)
    );
    let labels = COMPARE_LABELS.iter().map(|l| l.to_string()).collect();

    (intro, vec![labels, compare_column(a), compare_column(b)])
}

/// Visit each live season group with its present mode blocks.
/// `line` renders one mode, `total` the group summary (if any).
fn write_groups<L, T>(title: &str, record: &PlayerRecord, mut line: L, mut total: T) -> String
where
    L: FnMut(&ModeInfo, &ModeStats) -> String,
    T: FnMut(SeasonView, &Rollup) -> Option<String>,
{
    let mut res = intro(title, record);
    res.push('\n');

    for view in SeasonView::live_groups() {
        let mut rollup = Rollup::default();
        for base in BaseMode::ALL {
            let info = mode_info(base, view);
            if let Some(stats) = record.mode(&info) {
                rollup.add(stats);
                res.push_str(&line(&info, stats));
                res.push('\n');
            }
        }
        if let Some(t) = total(view, &rollup) {
            res.push_str(&t);
            res.push('\n');
        }
        res.push('\n');
    }

    res
}

pub fn write_rating(record: &PlayerRecord) -> String {
    write_groups(
        "TRN Rating stats",
        record,
        |info, stats| format!("{} TRN Rating: {}", info.display_name, stats.trn_rating.display),
        |_, _| None,
    )
}

pub fn write_kd(record: &PlayerRecord) -> String {
    write_groups(
        "K/D Ratios",
        record,
        |info, stats| format!("{} K/D Ratio: {}", info.display_name, stats.kd.display),
        |view, rollup| {
            let kd = match view {
                SeasonView::Lifetime => record.lifetime.kd.clone(),
                _ => rollup.kd(),
            };
            Some(format!("{} K/D Ratio: {}", group_label(view), kd))
        },
    )
}

pub fn write_winrate(record: &PlayerRecord) -> String {
    write_groups(
        "Win Rates",
        record,
        |info, stats| {
            let wr = stats.win_ratio.as_ref().map_or("0", |w| w.display.as_str());
            format!("{} Win Rate: {}%", info.display_name, wr)
        },
        |view, rollup| Some(format!("{} Win Rate: {}%", group_label(view), rollup.win_rate())),
    )
}

/// Match history from the account matches endpoint
pub fn write_matches(
    record: &PlayerRecord,
    matches: &[MatchRecord],
    now: DateTime<Utc>,
) -> Result<(String, Table), StatsError> {
    if matches.is_empty() {
        return Err(StatsError::NoRecentMatches {
            handle: record.handle.clone(),
        });
    }

    let intro = intro("Match history", record).trim_end().to_string();
    let mut table: Table = ["Mode", "Matches", "Wins", "Kills", "Rating", "Time"]
        .iter()
        .map(|h| vec![h.to_string()])
        .collect();

    for m in matches {
        table[0].push(mode_label(&m.playlist));
        table[1].push(plural(m.matches, "match", "matches"));
        table[2].push(plural(m.wins, "win", "wins"));
        table[3].push(plural(m.kills, "kill", "kills"));
        table[4].push(format!("{:+.0}", m.trn_rating_change));
        table[5].push(age(now, m.collected_at));
    }

    Ok((intro, table))
}

pub fn write_store(items: &[StoreItem]) -> (String, Table) {
    let mut table: Table = vec![
        vec!["Item".to_string()],
        vec!["Rarity".to_string()],
        vec!["Type".to_string()],
        vec!["V-Bucks".to_string()],
    ];
    for item in items {
        table[0].push(truncate(&item.name, MAX_NAME_LEN));
        table[1].push(item.rarity.clone());
        table[2].push(item.category.clone());
        table[3].push(item.vbucks.to_string());
    }
    ("Current store items:".to_string(), table)
}

pub fn write_challenges(challenges: &[Challenge]) -> (String, Table) {
    let mut table: Table = vec![
        vec!["Challenge".to_string()],
        vec!["Total".to_string()],
        vec!["Stars".to_string()],
    ];
    for c in challenges {
        table[0].push(truncate(&c.name, MAX_NAME_LEN));
        table[1].push(c.total.to_string());
        table[2].push(c.reward.to_string());
    }
    ("Current weekly challenges:".to_string(), table)
}

pub fn write_leaderboards(entries: &[LeaderboardEntry]) -> (String, Table) {
    let mut table: Table = vec![
        vec!["Rank".to_string()],
        vec!["Player".to_string()],
        vec!["Wins".to_string()],
    ];
    for e in entries {
        table[0].push(e.rank.clone());
        table[1].push(truncate(&e.player, MAX_NAME_LEN));
        table[2].push(e.value.clone());
    }
    (format!("Leaderboards:\n{}", LEADERBOARDS_URL), table)
}
