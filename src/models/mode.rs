// Mode registry
// Single source of truth mapping a mode + season view to its upstream field key

use thiserror::Error;

use crate::utils::config::{CURR_SEASON, FIRST_ARCHIVED_SEASON};

/// Base game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseMode {
    Solo,
    Duo,
    Squad,
}

impl BaseMode {
    pub const ALL: [BaseMode; 3] = [BaseMode::Solo, BaseMode::Duo, BaseMode::Squad];

    /// Placement buckets shown for this mode, fixed regardless of season
    pub fn top_buckets(&self) -> [u32; 2] {
        match self {
            BaseMode::Solo => [10, 25],
            BaseMode::Duo => [5, 12],
            BaseMode::Squad => [3, 6],
        }
    }

    /// Upstream playlist id (also used by recent matches)
    pub fn playlist(&self) -> &'static str {
        match self {
            BaseMode::Solo => "p2",
            BaseMode::Duo => "p10",
            BaseMode::Squad => "p9",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BaseMode::Solo => "Solo",
            BaseMode::Duo => "Duo",
            BaseMode::Squad => "Squad",
        }
    }

    /// Find the mode whose playlist id matches (e.g. `"p10"` -> Duo)
    pub fn from_playlist(playlist: &str) -> Option<BaseMode> {
        BaseMode::ALL.into_iter().find(|m| m.playlist() == playlist)
    }

    fn from_name(name: &str) -> Option<BaseMode> {
        match name {
            "solo" => Some(BaseMode::Solo),
            "duo" => Some(BaseMode::Duo),
            "squad" => Some(BaseMode::Squad),
            _ => None,
        }
    }
}

/// Which slice of a player's history a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeasonView {
    Lifetime,
    /// The season currently served live by upstream
    Current,
    /// The previous season, still served live by upstream
    Prior,
    /// An older season only available from the archival store
    Archived(u32),
}

impl SeasonView {
    /// Map a season number to its view. `None` means the season is no longer
    /// served anywhere.
    pub fn from_season(season: u32) -> Option<SeasonView> {
        if season == CURR_SEASON {
            Some(SeasonView::Current)
        } else if CURR_SEASON.checked_sub(1) == Some(season) {
            Some(SeasonView::Prior)
        } else if (FIRST_ARCHIVED_SEASON..CURR_SEASON.saturating_sub(1)).contains(&season) {
            Some(SeasonView::Archived(season))
        } else {
            None
        }
    }

    /// Season number, or `None` for lifetime
    pub fn number(&self) -> Option<u32> {
        match self {
            SeasonView::Lifetime => None,
            SeasonView::Current => Some(CURR_SEASON),
            SeasonView::Prior => Some(CURR_SEASON - 1),
            SeasonView::Archived(n) => Some(*n),
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(self, SeasonView::Archived(_))
    }

    /// Views served by a live upstream record, in report order
    pub fn live_groups() -> [SeasonView; 3] {
        [SeasonView::Lifetime, SeasonView::Current, SeasonView::Prior]
    }

    fn id_prefix(&self) -> String {
        match self {
            SeasonView::Lifetime => String::new(),
            SeasonView::Current => "curr_".to_string(),
            SeasonView::Prior => "prior_".to_string(),
            SeasonView::Archived(n) => format!("s{}_", n),
        }
    }
}

/// Registry entry for one mode in one season view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeInfo {
    pub base: BaseMode,
    pub season: SeasonView,
    /// Key of the mode block inside a `PlayerRecord`
    pub id: String,
    pub top_buckets: [u32; 2],
    pub display_name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown mode: {0}")]
    UnknownMode(String),
}

/// Build the registry entry for a mode and season view
pub fn mode_info(base: BaseMode, season: SeasonView) -> ModeInfo {
    let display_name = match season.number() {
        Some(n) => format!("Season {} {}", n, base.label()),
        None => base.label().to_string(),
    };

    ModeInfo {
        base,
        season,
        id: format!("{}{}", season.id_prefix(), base.playlist()),
        top_buckets: base.top_buckets(),
        display_name,
    }
}

/// Resolve a mode name such as `solo`, `duos9` or `squads5`.
///
/// Unknown names (including seasons that are not served) are a programmer
/// error: the command parser only hands over names it has already validated.
pub fn resolve(name: &str) -> Result<ModeInfo, RegistryError> {
    let lower = name.to_lowercase();
    let unknown = || RegistryError::UnknownMode(name.to_string());

    if let Some(base) = BaseMode::from_name(&lower) {
        return Ok(mode_info(base, SeasonView::Lifetime));
    }

    let (base_name, digits) = lower.rsplit_once('s').ok_or_else(unknown)?;
    let base = BaseMode::from_name(base_name).ok_or_else(unknown)?;
    let season: u32 = digits.parse().map_err(|_| unknown())?;
    let view = SeasonView::from_season(season).ok_or_else(unknown)?;

    Ok(mode_info(base, view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("solo", "p2", [10, 25], "Solo")]
    #[case("duo", "p10", [5, 12], "Duo")]
    #[case("squad", "p9", [3, 6], "Squad")]
    #[case("solos9", "curr_p2", [10, 25], "Season 9 Solo")]
    #[case("duos8", "prior_p10", [5, 12], "Season 8 Duo")]
    #[case("squads5", "s5_p9", [3, 6], "Season 5 Squad")]
    fn test_resolve(
        #[case] name: &str,
        #[case] id: &str,
        #[case] top: [u32; 2],
        #[case] display: &str,
    ) {
        let info = resolve(name).unwrap();
        assert_eq!(info.id, id);
        assert_eq!(info.top_buckets, top);
        assert_eq!(info.display_name, display);
    }

    #[rstest]
    #[case("trio")]
    #[case("solos1")]
    #[case("duosx")]
    #[case("")]
    fn test_resolve_unknown(#[case] name: &str) {
        assert_eq!(
            resolve(name),
            Err(RegistryError::UnknownMode(name.to_string()))
        );
    }

    #[test]
    fn test_season_views() {
        assert_eq!(SeasonView::from_season(CURR_SEASON), Some(SeasonView::Current));
        assert_eq!(SeasonView::from_season(CURR_SEASON - 1), Some(SeasonView::Prior));
        assert_eq!(
            SeasonView::from_season(FIRST_ARCHIVED_SEASON),
            Some(SeasonView::Archived(FIRST_ARCHIVED_SEASON))
        );
        assert_eq!(SeasonView::from_season(FIRST_ARCHIVED_SEASON - 1), None);
        assert_eq!(SeasonView::from_season(CURR_SEASON + 1), None);
        assert_eq!(SeasonView::from_season(u32::MAX), None);
    }

    #[test]
    fn test_buckets_fixed_across_seasons() {
        for base in BaseMode::ALL {
            for view in SeasonView::live_groups() {
                assert_eq!(mode_info(base, view).top_buckets, base.top_buckets());
            }
        }
    }

    #[test]
    fn test_from_playlist() {
        assert_eq!(BaseMode::from_playlist("p10"), Some(BaseMode::Duo));
        assert_eq!(BaseMode::from_playlist("p99"), None);
    }
}
