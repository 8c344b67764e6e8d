// Spam filter configuration commands.

use super::{reply_ephemeral, Context, Error};
use crate::core::filtering::pipeline::SPAM_COOLDOWN;
use poise::serenity_prelude as serenity;

/// Spam filter configuration.
#[poise::command(
    slash_command,
    subcommands("enable", "disable", "ignore", "unignore", "alert_role", "status"),
    required_permissions = "MANAGE_MESSAGES",
    guild_only
)]
pub async fn spamfilter(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Enable the spam filter across the server.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    set_enabled(ctx, true).await
}

/// Disable the spam filter across the server.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    set_enabled(ctx, false).await
}

async fn set_enabled(ctx: Context<'_>, enabled: bool) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .filters
        .set_spam_enabled(guild_id.get(), enabled)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    reply_ephemeral(
        ctx,
        format!(
            "✅ Spam filter is now {} across the server.",
            if enabled { "enabled" } else { "disabled" }
        ),
    )
    .await
}

/// Disable the spam filter in a specific channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn ignore(
    ctx: Context<'_>,
    #[description = "Channel to exempt"] channel: serenity::Channel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let changed = ctx
        .data()
        .filters
        .set_spam_channel_ignored(guild_id.get(), channel.id().get(), true)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if changed {
        reply_ephemeral(
            ctx,
            format!("✅ Spam filter disabled in <#{}>.", channel.id()),
        )
        .await
    } else {
        reply_ephemeral(ctx, "⚠️ This channel is already ignored.").await
    }
}

/// Re-enable the spam filter in an ignored channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn unignore(
    ctx: Context<'_>,
    #[description = "Channel to re-enable"] channel: serenity::Channel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let changed = ctx
        .data()
        .filters
        .set_spam_channel_ignored(guild_id.get(), channel.id().get(), false)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if changed {
        reply_ephemeral(
            ctx,
            format!("✅ Spam filter re-enabled in <#{}>.", channel.id()),
        )
        .await
    } else {
        reply_ephemeral(ctx, "⚠️ This channel is not ignored.").await
    }
}

/// Set (or clear) the role tagged in spam log reports.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn alert_role(
    ctx: Context<'_>,
    #[description = "Role to ping; omit to clear"] role: Option<serenity::Role>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let role_id = role.as_ref().map(|r| r.id.get());

    ctx.data()
        .filters
        .set_spam_alert_role(guild_id.get(), role_id)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    match role {
        Some(role) => {
            reply_ephemeral(ctx, format!("✅ Spam alert role set to: <@&{}>", role.id)).await
        }
        None => reply_ephemeral(ctx, "✅ Spam alert role cleared.").await,
    }
}

/// Show current spam filter settings.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let config = ctx
        .data()
        .filters
        .spam_settings(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let ignored = if config.ignored_channels.is_empty() {
        "None".to_string()
    } else {
        config
            .ignored_channels
            .iter()
            .map(|id| format!("<#{id}>"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let alert = match config.alert_role_id {
        Some(role_id) => format!("<@&{role_id}>"),
        None => "Not set".to_string(),
    };

    let embed = serenity::CreateEmbed::new()
        .title("🛡️ Spam Filter Status")
        .color(0xf1c40f)
        .field(
            "Status",
            if config.enabled {
                "✅ Enabled"
            } else {
                "❌ Disabled"
            },
            false,
        )
        .field("Ignored Channels", ignored, false)
        .field("Alert Role", alert, false)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Cooldown: {}s per user",
            SPAM_COOLDOWN.as_secs()
        )));

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
