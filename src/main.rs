// Fortnite Stats Bot - Rust Edition
// Discord bot answering Fortnite player stat commands

mod commands;
mod api;
mod features;
mod models;
mod utils;

use std::env;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::firebase::FirebaseClient;
use crate::api::store::{KeyValueStore, MemoryStore};
use crate::api::tracker::TrackerClient;
use crate::features::archive::ArchivalStore;
use crate::features::discord::DiscordSink;
use crate::features::engine::StatsEngine;
use crate::features::identity::IdentityCache;
use crate::features::resolver::PlatformResolver;
use crate::features::stats_cache::VolatileStatsCache;
use crate::utils::clock::SystemClock;
use crate::utils::config::BotConfig;

/// User data shared across all commands and events
pub struct Data {
    pub engine: Arc<StatsEngine>,
}

// Manual Debug impl since StatsEngine holds trait objects
impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("engine", &"StatsEngine")
            .finish()
    }
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Register all slash commands
fn get_commands() -> Vec<poise::Command<Data, Error>> {
    vec![commands::help::help()]
}

/// Chat commands arrive as plain messages
async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        if let Err(e) = features::discord::handle_stats_message(&data.engine, new_message).await {
            error!("Message handler error: {:?}", e);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "fortnite_stats_rs=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = BotConfig::from_env()?;

    info!("Starting Fortnite Stats Bot (Rust Edition)...");

    // Build HTTP client for API calls
    let http_client = reqwest::Client::builder()
        .user_agent("Fortnite-Stats-Bot/1.0")
        .build()?;

    let tracker = Arc::new(TrackerClient::new(
        http_client.clone(),
        config.tracker_api_key.clone(),
    ));

    let store: Arc<dyn KeyValueStore> =
        match FirebaseClient::from_file(http_client.clone(), &config.firebase_key_path) {
            Ok(firebase) => {
                info!("Firebase client initialized");
                Arc::new(firebase)
            }
            Err(e) => {
                warn!(
                    path = %config.firebase_key_path,
                    error = %e,
                    "Firebase credentials unavailable, using in-memory store"
                );
                Arc::new(MemoryStore::new())
            }
        };

    let clock = Arc::new(SystemClock);
    let cache = Arc::new(VolatileStatsCache::new(config.cache_ttl, clock.clone()));
    let reset_task = cache.spawn_reset_task(config.cache_reset_interval);

    let sink = Arc::new(DiscordSink::new(Arc::new(serenity::Http::new(
        &config.discord_token,
    ))));

    let engine = Arc::new(StatsEngine::new(
        PlatformResolver::new(
            tracker.clone(),
            cache,
            ArchivalStore::new(store.clone()),
        ),
        IdentityCache::new(store),
        tracker,
        sink,
        clock,
        config.command_prefix.clone(),
    ));

    // Setup framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Command error: {:?}", error);
                            let _ = ctx.say("Something went wrong. Please try again.").await;
                        }
                        err => {
                            error!("Framework error: {:?}", err);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready! Registering commands...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully!");

                Ok(Data { engine })
            })
        })
        .build();

    // MESSAGE_CONTENT is privileged, enable it in the Discord Dev Portal
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    // Run with graceful shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to register Ctrl+C handler: {:?}", e);
            return;
        }
        info!("Shutting down...");
        shard_manager.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    reset_task.abort();
    info!("Goodbye!");
    Ok(())
}
