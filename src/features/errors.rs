// Error taxonomy for stats requests

use thiserror::Error;

use crate::api::store::StoreError;
use crate::api::tracker::SourceError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    /// Handle missing on every platform tried
    #[error("Handle not found: {}", handles.join(", "))]
    NotFound { handles: Vec<String> },

    /// Upstream outage on the last platform tried
    #[error("Stats source unavailable")]
    Unavailable,

    /// Season no longer served and no archival snapshot exists
    #[error("Deprecated season")]
    Deprecated,

    /// No remembered handle for the messaging account
    #[error("No handle mapped to account")]
    NotMapped,

    #[error("{handle} has no {mode} data")]
    ModeNotFound { handle: String, mode: String },

    #[error("{handle} has no recent matches")]
    NoRecentMatches { handle: String },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StatsError {
    /// Classify an upstream failure for a single handle
    pub fn from_source(err: SourceError, handle: &str) -> Self {
        match err {
            SourceError::NotFound => StatsError::NotFound {
                handles: vec![handle.to_string()],
            },
            SourceError::Unavailable => StatsError::Unavailable,
            SourceError::Other(msg) => StatsError::Upstream(msg),
        }
    }

    /// Short sentence shown to the chat user
    pub fn user_message(&self) -> String {
        match self {
            StatsError::NotFound { handles } => match handles.as_slice() {
                [a, b, ..] => format!("User {} or {} not found.", a, b),
                [a] => format!("User {} not found.", a),
                [] => "User not found.".to_string(),
            },
            StatsError::Unavailable => "Fortnite Tracker API is unavailable.".to_string(),
            StatsError::Deprecated => "Deprecated command.".to_string(),
            StatsError::NotMapped => {
                "No user mapped to your messaging account. Use /set to map a Fortnite username."
                    .to_string()
            }
            StatsError::ModeNotFound { handle, mode } => {
                format!("User {} has never played {}.", handle, mode)
            }
            StatsError::NoRecentMatches { handle } => {
                format!("User {} has no recent matches.", handle)
            }
            StatsError::Upstream(_) | StatsError::Store(_) => {
                "Something went wrong while fetching stats. Please try again.".to_string()
            }
        }
    }
}
