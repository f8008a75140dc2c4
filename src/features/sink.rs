// Message sink capability
// Where finished reports are delivered

use async_trait::async_trait;
use thiserror::Error;

use crate::utils::formatters::transpose;

/// Sentence sent when a text report cannot be rendered with markup
pub const MARKDOWN_FALLBACK: &str =
    "Error with parsing username in Markdown. Try using /rold instead.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Content clashes with the sink's markup
    #[error("Rendering error: {0}")]
    Rendering(String),
    #[error("Delivery error: {0}")]
    Delivery(String),
}

/// Channel and author a reply is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub channel_id: u64,
    pub author_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Intro line(s) plus a column-oriented table
    Table {
        intro: String,
        columns: Vec<Vec<String>>,
    },
}

impl Reply {
    /// Markup-free rendering used after a `Rendering` failure.
    ///
    /// Tables become one `a - b - c` line per row. Text cannot be salvaged,
    /// so it is replaced by a hint to use the legacy format.
    pub fn plain_fallback(&self) -> Reply {
        match self {
            Reply::Text(_) => Reply::Text(MARKDOWN_FALLBACK.to_string()),
            Reply::Table { intro, columns } => {
                let mut lines = vec![intro.clone()];
                // Skip the header row
                lines.extend(
                    transpose(columns)
                        .into_iter()
                        .skip(1)
                        .map(|row| {
                            row.iter()
                                .map(|cell| cell.trim())
                                .collect::<Vec<_>>()
                                .join(" - ")
                        }),
                );
                Reply::Text(lines.join("\n"))
            }
        }
    }
}

#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, target: &Target, reply: Reply) -> Result<(), SinkError>;
}
