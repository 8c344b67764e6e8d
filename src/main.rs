// This is the entry point of the moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON stores)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::audit::AuditService;
use crate::core::filtering::{EnforcementPipeline, FilterService};
use crate::discord::filtering::StickyReminders;
use crate::discord::{Data, Error};
use crate::infra::audit::JsonAuditStore;
use crate::infra::filtering::JsonFilterStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often idle per-user filter state is swept.
const STATE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Event handler for non-command Discord events. Every inbound message runs
/// through the enforcement pipeline; other events are out of scope here.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        // Platform hiccups are reported here and never crash the handler.
        if let Err(error) = discord::filtering::handle_message(ctx, new_message, data).await {
            tracing::error!(%error, "message filtering failed");
        }
    }

    Ok(())
}

/// Command failures are logged for the operator; the invoker only sees a
/// generic ephemeral notice instead of internal error text.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(command = %ctx.command().qualified_name, %error, "command failed");
            let _ = ctx
                .send(
                    poise::CreateReply::default()
                        .content("❌ Something went wrong. Please try again later.")
                        .ephemeral(true),
                )
                .await;
        }
        other => {
            if let Err(error) = poise::builtins::on_error(other).await {
                tracing::error!(%error, "error while handling command error");
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Keep runtime settings in a dedicated folder so the repo root stays tidy.
    let data_dir = std::path::Path::new("data/settings");
    std::fs::create_dir_all(data_dir).expect("Failed to create settings directory");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let filter_store = JsonFilterStore::new(data_dir);
    let filter_service = Arc::new(FilterService::new(filter_store));

    let audit_store = JsonAuditStore::new(data_dir.join("log_channel.json"));
    let audit_service = Arc::new(AuditService::new(audit_store));

    let pipeline = Arc::new(EnforcementPipeline::new());
    let sticky_reminders = Arc::new(StickyReminders::default());

    let data = Data {
        filters: Arc::clone(&filter_service),
        pipeline: Arc::clone(&pipeline),
        audit: Arc::clone(&audit_service),
        sticky_reminders: Arc::clone(&sticky_reminders),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::bad_words::badword(),
                discord::commands::link_filter::linkfilter(),
                discord::commands::spam_filter::spamfilter(),
                discord::commands::sticky::sticky(),
                discord::commands::settings::setlogchannel(),
                discord::commands::settings::botstatus(),
                discord::commands::settings::reloadsettings(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("bot is starting up");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("commands registered, bot is ready");

                // Sweep idle cooldown/history entries so the per-user maps
                // stay bounded over long uptimes.
                let sweeper = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    loop {
                        tokio::time::sleep(STATE_SWEEP_INTERVAL).await;
                        sweeper.sweep_user_state(Instant::now());
                        tracing::debug!("swept idle filter state");
                    }
                });

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
