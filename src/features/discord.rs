// Discord adapter
// Feeds chat messages to the engine and delivers replies through serenity

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::debug;

use crate::features::engine::StatsEngine;
use crate::features::sink::{MessageSink, Reply, SinkError, Target};
use crate::utils::config::DISCORD_MESSAGE_LIMIT;
use crate::utils::formatters::render_table;

const FENCE: &str = "```";

/// Sends replies to a channel, mentioning the author
pub struct DiscordSink {
    http: Arc<serenity::Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

/// Build the message bodies for a reply, each below the Discord limit
fn render(target: &Target, reply: &Reply) -> Result<Vec<String>, SinkError> {
    let mention = format!("<@{}>", target.author_id);

    match reply {
        Reply::Text(text) => {
            if text.contains(FENCE) {
                return Err(SinkError::Rendering("code fence in text".to_string()));
            }
            Ok(chunk_lines(&format!("{}\n{}", mention, text), DISCORD_MESSAGE_LIMIT))
        }
        Reply::Table { intro, columns } => {
            if intro.contains(FENCE) || columns.iter().flatten().any(|c| c.contains(FENCE)) {
                return Err(SinkError::Rendering("code fence in table".to_string()));
            }

            let mut bodies = chunk_lines(&format!("{}\n{}", mention, intro), DISCORD_MESSAGE_LIMIT);
            // Room for the fences and their newlines
            let room = DISCORD_MESSAGE_LIMIT - 2 * FENCE.len() - 2;
            bodies.extend(
                chunk_lines(&render_table(columns), room)
                    .into_iter()
                    .map(|chunk| format!("{FENCE}\n{chunk}\n{FENCE}")),
            );
            Ok(bodies)
        }
    }
}

/// Split text at line boundaries so no chunk exceeds `max_len` bytes.
/// Lines that are too long on their own are hard-split on char boundaries.
fn chunk_lines(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let mut line = line;
        while line.len() > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let mut cut = max_len;
            while !line.is_char_boundary(cut) {
                cut -= 1;
            }
            chunks.push(line[..cut].to_string());
            line = &line[cut..];
        }

        if !current.is_empty() && current.len() + line.len() + 1 > max_len {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[async_trait]
impl MessageSink for DiscordSink {
    async fn send(&self, target: &Target, reply: Reply) -> Result<(), SinkError> {
        let channel = serenity::ChannelId::new(target.channel_id);

        for body in render(target, &reply)? {
            channel
                .send_message(&self.http, serenity::CreateMessage::new().content(body))
                .await
                .map_err(|e| SinkError::Delivery(e.to_string()))?;
        }

        Ok(())
    }
}

/// Route a new guild or DM message to the stats engine
pub async fn handle_stats_message(
    engine: &StatsEngine,
    msg: &serenity::Message,
) -> Result<(), anyhow::Error> {
    // Ignore bots
    if msg.author.bot {
        return Ok(());
    }

    let target = Target {
        channel_id: msg.channel_id.get(),
        author_id: msg.author.id.get(),
    };
    let account_id = msg.author.id.get().to_string();

    // Delivery failures are logged by the event handler
    engine.handle_message(&msg.content, &account_id, &target).await?;

    debug!(channel = target.channel_id, "Handled message");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: Target = Target {
        channel_id: 10,
        author_id: 42,
    };

    #[test]
    fn test_text_gets_mention() {
        let bodies = render(&TARGET, &Reply::Text("User ninja not found.".to_string())).unwrap();
        assert_eq!(bodies, vec!["<@42>\nUser ninja not found."]);
    }

    #[test]
    fn test_table_in_code_block() {
        let reply = Reply::Table {
            intro: "Recent matches for ninja:".to_string(),
            columns: vec![
                vec!["Mode".to_string(), "Solo".to_string()],
                vec!["Wins".to_string(), "1 win".to_string()],
            ],
        };

        let bodies = render(&TARGET, &reply).unwrap();
        assert_eq!(bodies[0], "<@42>\nRecent matches for ninja:");
        assert_eq!(bodies[1], "```\nMode  Wins\nSolo  1 win\n```");
    }

    #[test]
    fn test_fence_is_rendering_error() {
        let reply = Reply::Text("Lifetime stats for ```ninja".to_string());
        assert!(matches!(render(&TARGET, &reply), Err(SinkError::Rendering(_))));

        let reply = Reply::Table {
            intro: "x".to_string(),
            columns: vec![vec!["User".to_string(), "a```b".to_string()]],
        };
        assert!(matches!(render(&TARGET, &reply), Err(SinkError::Rendering(_))));
    }

    #[test]
    fn test_chunk_lines_respects_limit() {
        let text = (0..500).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let chunks = chunk_lines(&text, 100);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= 100));
        assert_eq!(chunks.join("\n"), text);
    }

    #[test]
    fn test_chunk_lines_hard_splits_long_line() {
        let text = "é".repeat(80);
        let chunks = chunk_lines(&text, 25);
        assert!(chunks.iter().all(|c| c.len() <= 25));
        assert_eq!(chunks.concat(), text);
    }
}
