// Help command - show the chat command guide

use poise::serenity_prelude as serenity;
use crate::{Context, Error};
use crate::utils::config::{colors, help_text, CURR_SEASON};

/// Show help and usage guide
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("Fortnite Stats - Help")
        .description(help_text())
        .color(colors::PRIMARY)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Current season: {}",
            CURR_SEASON
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
