// Sticky channel commands - toggle post-only mode for the current channel.

use super::{reply_ephemeral, Context, Error};

/// Sticky (post-only) channel configuration.
#[poise::command(
    slash_command,
    subcommands("enable", "disable"),
    required_permissions = "ADMINISTRATOR",
    guild_only
)]
pub async fn sticky(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Enable sticky note mode in this channel.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let changed = ctx
        .data()
        .filters
        .set_sticky(ctx.channel_id().get(), true)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if changed {
        reply_ephemeral(ctx, "✅ Sticky note mode enabled in this channel.").await
    } else {
        reply_ephemeral(ctx, "⚠️ Sticky mode is already enabled in this channel.").await
    }
}

/// Disable sticky note mode in this channel.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let changed = ctx
        .data()
        .filters
        .set_sticky(ctx.channel_id().get(), false)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if changed {
        reply_ephemeral(ctx, "✅ Sticky note mode disabled in this channel.").await
    } else {
        reply_ephemeral(ctx, "⚠️ Sticky mode is not enabled in this channel.").await
    }
}
