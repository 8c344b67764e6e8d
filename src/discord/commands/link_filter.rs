// Link filter configuration commands. All of these act on the channel the
// command is invoked in, mirroring how the filter itself is scoped.

use super::{reply_ephemeral, Context, Error};
use crate::core::audit::{AuditEntry, AuditSink};
use crate::discord::audit::ChannelAuditLogger;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Link filter configuration for this channel.
#[poise::command(
    slash_command,
    subcommands(
        "enable",
        "disable",
        "allow_domain",
        "remove_domain",
        "allow_role",
        "remove_role",
        "status"
    ),
    required_permissions = "MANAGE_MESSAGES",
    guild_only
)]
pub async fn linkfilter(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Enable link filtering in this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    set_enabled(ctx, true).await
}

/// Disable link filtering in this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    set_enabled(ctx, false).await
}

async fn set_enabled(ctx: Context<'_>, enabled: bool) -> Result<(), Error> {
    let channel_id = ctx.channel_id().get();

    ctx.data()
        .filters
        .set_link_filter_enabled(channel_id, enabled)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let status = if enabled { "enabled ✅" } else { "disabled ❌" };
    reply_ephemeral(
        ctx,
        format!("🔒 Link filter has been {status} in this channel."),
    )
    .await?;

    log_config_change(
        ctx,
        "🔧 Link Filter Toggled",
        format!(
            "**<@{}>** set link filter to `{}` in <#{}>",
            ctx.author().id,
            enabled,
            channel_id
        ),
    )
    .await;
    Ok(())
}

/// Allow a specific domain (like youtube.com) in this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn allow_domain(
    ctx: Context<'_>,
    #[description = "Domain to whitelist"] domain: String,
) -> Result<(), Error> {
    let channel_id = ctx.channel_id().get();
    let domain = domain.to_lowercase();

    let added = ctx
        .data()
        .filters
        .add_whitelisted_domain(channel_id, &domain)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if !added {
        return reply_ephemeral(ctx, "⚠️ This domain is already allowed.").await;
    }

    reply_ephemeral(
        ctx,
        format!("✅ `{domain}` has been whitelisted for this channel."),
    )
    .await?;

    log_config_change(
        ctx,
        "➕ Domain Whitelisted",
        format!(
            "`{}` allowed by <@{}> in <#{}>",
            domain,
            ctx.author().id,
            channel_id
        ),
    )
    .await;
    Ok(())
}

/// Remove a whitelisted domain from this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn remove_domain(
    ctx: Context<'_>,
    #[description = "Domain to remove"] domain: String,
) -> Result<(), Error> {
    let channel_id = ctx.channel_id().get();
    let domain = domain.to_lowercase();

    let removed = ctx
        .data()
        .filters
        .remove_whitelisted_domain(channel_id, &domain)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if !removed {
        return reply_ephemeral(ctx, "⚠️ That domain is not whitelisted.").await;
    }

    reply_ephemeral(ctx, format!("✅ `{domain}` removed from whitelist.")).await?;

    log_config_change(
        ctx,
        "➖ Domain Removed from Whitelist",
        format!(
            "`{}` removed by <@{}> in <#{}>",
            domain,
            ctx.author().id,
            channel_id
        ),
    )
    .await;
    Ok(())
}

/// Allow members with a role to bypass the link filter in this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn allow_role(
    ctx: Context<'_>,
    #[description = "Role that may post links"] role: serenity::Role,
) -> Result<(), Error> {
    let channel_id = ctx.channel_id().get();

    let added = ctx
        .data()
        .filters
        .add_whitelisted_role(channel_id, role.id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if added {
        reply_ephemeral(
            ctx,
            format!("✅ Role <@&{}> is now allowed to post links.", role.id),
        )
        .await
    } else {
        reply_ephemeral(ctx, "⚠️ This role is already whitelisted.").await
    }
}

/// Remove a role from the link whitelist in this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn remove_role(
    ctx: Context<'_>,
    #[description = "Role to remove"] role: serenity::Role,
) -> Result<(), Error> {
    let channel_id = ctx.channel_id().get();

    let removed = ctx
        .data()
        .filters
        .remove_whitelisted_role(channel_id, role.id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if removed {
        reply_ephemeral(ctx, format!("✅ Role <@&{}> removed from whitelist.", role.id)).await
    } else {
        reply_ephemeral(ctx, "⚠️ This role is not in whitelist.").await
    }
}

/// Show link filtering status and allowed domains for this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let config = ctx
        .data()
        .filters
        .link_settings(ctx.channel_id().get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let mut description = format!(
        "🔒 **Link Filter:** {}\n",
        if config.enabled {
            "Enabled ✅"
        } else {
            "Disabled ❌"
        }
    );

    if config.whitelisted_domains.is_empty() {
        description.push_str("\n*No domains are currently allowed.*");
    } else {
        description.push_str("\n**Allowed Domains:**\n");
        for domain in &config.whitelisted_domains {
            description.push_str(&format!("• `{domain}`\n"));
        }
    }

    if !config.whitelisted_roles.is_empty() {
        description.push_str("\n**Whitelisted Roles:**\n");
        for role_id in &config.whitelisted_roles {
            description.push_str(&format!("<@&{role_id}>\n"));
        }
    }

    let embed = serenity::CreateEmbed::new()
        .title("📁 Link Filter Settings")
        .description(description)
        .color(0x00b0f4);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Best-effort audit trail for configuration changes.
async fn log_config_change(ctx: Context<'_>, title: &str, body: String) {
    let Some(guild_id) = ctx.guild_id() else {
        return;
    };
    let author = ctx.author();

    let sink = ChannelAuditLogger::new(
        ctx.serenity_context().http.clone(),
        Arc::clone(&ctx.data().audit),
    );
    sink.log(AuditEntry {
        guild_id: guild_id.get(),
        title: title.to_string(),
        body,
        actor_id: author.id.get(),
        actor_name: author.name.clone(),
        actor_avatar_url: author.avatar_url(),
        ping_role_id: None,
        created_at: Utc::now(),
    })
    .await;
}
