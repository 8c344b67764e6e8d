// Bot-wide settings commands: log channel, status summary, settings reload.

use super::{reply_ephemeral, Context, Error};
use poise::serenity_prelude as serenity;

/// Set the log channel for this server.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn setlogchannel(
    ctx: Context<'_>,
    #[description = "Channel to receive audit logs"] channel: serenity::Channel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .audit
        .set_log_channel(guild_id.get(), channel.id().get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    reply_ephemeral(ctx, format!("✅ Log channel set to <#{}>", channel.id())).await
}

/// Show current bot feature status.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn botstatus(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let data = ctx.data();

    let log_channel = data
        .audit
        .log_channel(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;
    let bad_words = data
        .filters
        .bad_words(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;
    let sticky = data
        .filters
        .sticky_channels()
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let log_status = match log_channel {
        Some(id) => format!("<#{id}>"),
        None => "❌ Not Set".to_string(),
    };

    let sticky_status = if sticky.channels.is_empty() {
        "❌ None".to_string()
    } else {
        sticky
            .channels
            .iter()
            .map(|id| format!("<#{id}>"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let ignored = if bad_words.ignored_channels.is_empty() {
        "None".to_string()
    } else {
        bad_words
            .ignored_channels
            .iter()
            .map(|id| format!("<#{id}>"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let embed = serenity::CreateEmbed::new()
        .title("📊 Bot Feature Status")
        .color(0x3498db)
        .field("📁 Log Channel", log_status, false)
        .field("📌 Sticky Channels", sticky_status, false)
        .field("🧨 Bad Words Count", bad_words.words.len().to_string(), true)
        .field("🛑 Ignored Channels", ignored, false);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Reload all settings from disk.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn reloadsettings(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    if let Err(error) = data.filters.reload().await {
        return reply_ephemeral(ctx, format!("❌ Failed to reload: `{error}`")).await;
    }
    if let Err(error) = data.audit.reload().await {
        return reply_ephemeral(ctx, format!("❌ Failed to reload: `{error}`")).await;
    }

    reply_ephemeral(ctx, "🔁 All settings reloaded from disk.").await
}
