// Command parser
// Turns free chat text into a structured intent

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::error;

use crate::models::mode::{self, BaseMode, SeasonView};
use crate::models::platform::Platform;

/// What kind of report was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Global,
    Mode(BaseMode),
    Season,
    Recent,
    /// Legacy one-line-per-match recent format
    RecentLegacy,
    Rating,
    Kd,
    Winrate,
    Matches,
    Compare,
    Set,
    /// Save a per-account alias for a handle
    Nick,
    DeleteNick,
    Store,
    Challenges,
    Leaderboards,
    Help,
}

/// Handle named in the command, or a request to use the remembered one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleRef {
    Given(String),
    Remembered,
}

/// Who the report is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Player(HandleRef),
    Pair(String, String),
    Nobody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformChoice {
    TryAll,
    Only(Platform),
}

impl PlatformChoice {
    /// Platforms to try, in order
    pub fn platforms(&self) -> Vec<Platform> {
        match self {
            PlatformChoice::TryAll => Platform::ALL.to_vec(),
            PlatformChoice::Only(p) => vec![*p],
        }
    }
}

/// One parsed inbound command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub kind: ReportKind,
    pub account_id: String,
    pub subject: Subject,
    pub platform: PlatformChoice,
    pub season: SeasonView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Intent(Intent),
    /// Recognised command for a season that is no longer served
    Deprecated,
    /// Not a command; the message is ignored
    NoMatch,
}

/// What may follow the command name inside the command token itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    /// Nothing (`/set`, `/compare`, `/nick`, `/pc`, ...)
    None,
    /// `-xbox`, `ps4`, ...
    Platform,
    /// `s9`, `s9xbox`, ... on solo/duo/squad
    ModeSeason,
    /// Optional digits then platform on `/season`
    Season,
    /// Required digits then platform on `/s`
    ShortSeason,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Report(ReportKind),
    PlatformGlobal(Platform),
}

/// Longer names first so `season` is tried before `s`
const COMMANDS: &[(&str, Command, Suffix)] = &[
    ("user", Command::Report(ReportKind::Global), Suffix::Platform),
    ("pc", Command::PlatformGlobal(Platform::Pc), Suffix::None),
    ("xbox", Command::PlatformGlobal(Platform::Xbox), Suffix::None),
    ("ps4", Command::PlatformGlobal(Platform::Ps4), Suffix::None),
    ("solo", Command::Report(ReportKind::Mode(BaseMode::Solo)), Suffix::ModeSeason),
    ("duo", Command::Report(ReportKind::Mode(BaseMode::Duo)), Suffix::ModeSeason),
    ("squad", Command::Report(ReportKind::Mode(BaseMode::Squad)), Suffix::ModeSeason),
    ("season", Command::Report(ReportKind::Season), Suffix::Season),
    ("recent", Command::Report(ReportKind::Recent), Suffix::Platform),
    ("rold", Command::Report(ReportKind::RecentLegacy), Suffix::Platform),
    ("rating", Command::Report(ReportKind::Rating), Suffix::Platform),
    ("kd", Command::Report(ReportKind::Kd), Suffix::Platform),
    ("winrate", Command::Report(ReportKind::Winrate), Suffix::Platform),
    ("wr", Command::Report(ReportKind::Winrate), Suffix::Platform),
    ("matches", Command::Report(ReportKind::Matches), Suffix::Platform),
    ("compare", Command::Report(ReportKind::Compare), Suffix::None),
    ("set", Command::Report(ReportKind::Set), Suffix::None),
    ("nick", Command::Report(ReportKind::Nick), Suffix::None),
    ("deletenick", Command::Report(ReportKind::DeleteNick), Suffix::None),
    ("store", Command::Report(ReportKind::Store), Suffix::Platform),
    ("challenges", Command::Report(ReportKind::Challenges), Suffix::Platform),
    ("leaderboards", Command::Report(ReportKind::Leaderboards), Suffix::Platform),
    ("info", Command::Report(ReportKind::Help), Suffix::Platform),
    ("help", Command::Report(ReportKind::Help), Suffix::Platform),
    ("start", Command::Report(ReportKind::Help), Suffix::Platform),
    ("s", Command::Report(ReportKind::Season), Suffix::ShortSeason),
];

static PLATFORM_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-_]?(?P<platform>pc|xbox|ps4))?$").expect("valid regex"));
static MODE_SEASON_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:s(?P<season>\d+))?(?:[-_]?(?P<platform>pc|xbox|ps4))?$").expect("valid regex")
});
static SEASON_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<season>\d+)?(?:[-_]?(?P<platform>pc|xbox|ps4))?$").expect("valid regex")
});
static SHORT_SEASON_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<season>\d+)(?:[-_]?(?P<platform>pc|xbox|ps4))?$").expect("valid regex")
});

/// Pieces of a command token such as `solos9-xbox`
struct Token {
    command: Command,
    suffix: Suffix,
    season: Option<u32>,
    platform: Option<Platform>,
}

fn split_token(token: &str) -> Option<Token> {
    COMMANDS.iter().find_map(|&(name, command, suffix)| {
        let rest = token.strip_prefix(name)?;
        let caps = match suffix {
            Suffix::None => return rest.is_empty().then_some(Token {
                command,
                suffix,
                season: None,
                platform: None,
            }),
            Suffix::Platform => PLATFORM_SUFFIX.captures(rest)?,
            Suffix::ModeSeason => MODE_SEASON_SUFFIX.captures(rest)?,
            Suffix::Season => SEASON_SUFFIX.captures(rest)?,
            Suffix::ShortSeason => SHORT_SEASON_SUFFIX.captures(rest)?,
        };

        Some(Token {
            command,
            suffix,
            season: capture_season(&caps),
            platform: caps.name("platform").and_then(|m| m.as_str().parse().ok()),
        })
    })
}

fn capture_season(caps: &Captures<'_>) -> Option<u32> {
    // An absurdly long digit run cannot name a served season
    caps.name("season")
        .map(|m| m.as_str().parse().unwrap_or(u32::MAX))
}

/// Split a trailing ` pc` / ` xbox` / ` ps4` word off the arguments.
/// A lone platform word is treated as the handle.
fn split_trailing_platform(args: &str) -> (&str, Option<Platform>) {
    match args.rsplit_once(char::is_whitespace) {
        Some((head, last)) if !head.trim().is_empty() => {
            match Platform::ALL.into_iter().find(|p| p.command_name() == last) {
                Some(p) => (head.trim_end(), Some(p)),
                None => (args, None),
            }
        }
        _ => (args, None),
    }
}

/// Parse a chat message. `prefix` is the command prefix (usually `/`).
pub fn parse(text: &str, account_id: &str, prefix: &str) -> ParseOutcome {
    let lower = text.trim().to_lowercase();
    let body = match lower.strip_prefix(prefix) {
        Some(b) => b,
        None => return ParseOutcome::NoMatch,
    };

    let (raw_token, args) = match body.split_once(char::is_whitespace) {
        Some((t, a)) => (t, a.trim()),
        None => (body, ""),
    };
    // Telegram-style `/cmd@botname`
    let token_text = raw_token.split('@').next().unwrap_or(raw_token);

    let token = match split_token(token_text) {
        Some(t) => t,
        None => return ParseOutcome::NoMatch,
    };

    let (args, platform) = match token.platform {
        Some(p) => (args, Some(p)),
        None if token.suffix != Suffix::None => split_trailing_platform(args),
        None => (args, None),
    };

    let kind = match token.command {
        Command::Report(kind) => kind,
        Command::PlatformGlobal(_) => ReportKind::Global,
    };
    let platform = match token.command {
        Command::PlatformGlobal(p) => PlatformChoice::Only(p),
        Command::Report(_) => platform.map_or(PlatformChoice::TryAll, PlatformChoice::Only),
    };

    let season = match (kind, token.season) {
        (ReportKind::Mode(base), season) => {
            let (view, name) = match season {
                Some(n) => match SeasonView::from_season(n) {
                    Some(view) => (view, format!("{}s{}", base.label().to_lowercase(), n)),
                    None => return ParseOutcome::Deprecated,
                },
                None => (SeasonView::Lifetime, base.label().to_lowercase()),
            };
            // Every served season has a registry entry
            match mode::resolve(&name) {
                Ok(info) => info.season,
                Err(e) => {
                    error!(error = %e, mode = %name, "Mode registry rejected a validated mode");
                    view
                }
            }
        }
        (ReportKind::Season, None) => SeasonView::Current,
        (_, None) => SeasonView::Lifetime,
        (_, Some(n)) => match SeasonView::from_season(n) {
            Some(view) => view,
            None => return ParseOutcome::Deprecated,
        },
    };

    let subject = match kind {
        ReportKind::Store | ReportKind::Challenges | ReportKind::Leaderboards | ReportKind::Help => {
            Subject::Nobody
        }
        ReportKind::Compare | ReportKind::Nick => match args.split_once(',') {
            Some((a, b)) if !a.trim().is_empty() && !b.trim().is_empty() => {
                Subject::Pair(a.trim().to_string(), b.trim().to_string())
            }
            _ => return ParseOutcome::NoMatch,
        },
        ReportKind::Set | ReportKind::DeleteNick if args.is_empty() => {
            return ParseOutcome::NoMatch
        }
        _ if args.is_empty() => Subject::Player(HandleRef::Remembered),
        _ => Subject::Player(HandleRef::Given(args.to_string())),
    };

    ParseOutcome::Intent(Intent {
        kind,
        account_id: account_id.to_string(),
        subject,
        platform,
        season,
    })
}
