// Bad word filter configuration commands.

use super::{reply_ephemeral, Context, Error};
use poise::serenity_prelude as serenity;

/// Bad word filter configuration.
#[poise::command(
    slash_command,
    subcommands("add", "remove", "list", "ignore", "unignore", "status"),
    required_permissions = "MANAGE_MESSAGES",
    guild_only
)]
pub async fn badword(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - shows help
    Ok(())
}

/// Add a word to the bad word list.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Word to filter"] word: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let added = ctx
        .data()
        .filters
        .add_bad_word(guild_id.get(), &word)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if added {
        reply_ephemeral(
            ctx,
            format!(
                "✅ `{}` has been added to the bad word list.",
                word.to_lowercase()
            ),
        )
        .await
    } else {
        reply_ephemeral(ctx, "⚠️ That word is already in the list.").await
    }
}

/// Remove a word from the bad word list.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Word to remove"] word: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let removed = ctx
        .data()
        .filters
        .remove_bad_word(guild_id.get(), &word)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if removed {
        reply_ephemeral(
            ctx,
            format!(
                "✅ `{}` has been removed from the list.",
                word.to_lowercase()
            ),
        )
        .await
    } else {
        reply_ephemeral(ctx, "⚠️ That word is not in the list.").await
    }
}

/// Show all filtered words.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let config = ctx
        .data()
        .filters
        .bad_words(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if config.words.is_empty() {
        return reply_ephemeral(ctx, "🚫 No bad words set yet.").await;
    }

    let word_list = config
        .words
        .iter()
        .map(|w| format!("`{w}`"))
        .collect::<Vec<_>>()
        .join(", ");

    let embed = serenity::CreateEmbed::new()
        .title("🧨 Bad Words List")
        .description(word_list)
        .color(0xe74c3c);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Disable the bad word filter in a channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn ignore(
    ctx: Context<'_>,
    #[description = "Channel to exempt"] channel: serenity::Channel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let changed = ctx
        .data()
        .filters
        .set_bad_word_channel_ignored(guild_id.get(), channel.id().get(), true)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if changed {
        reply_ephemeral(ctx, format!("✅ Filter disabled in <#{}>", channel.id())).await
    } else {
        reply_ephemeral(ctx, "⚠️ This channel is already ignored.").await
    }
}

/// Re-enable the bad word filter in an ignored channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn unignore(
    ctx: Context<'_>,
    #[description = "Channel to re-enable"] channel: serenity::Channel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let changed = ctx
        .data()
        .filters
        .set_bad_word_channel_ignored(guild_id.get(), channel.id().get(), false)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if changed {
        reply_ephemeral(ctx, format!("✅ Filter re-enabled in <#{}>", channel.id())).await
    } else {
        reply_ephemeral(ctx, "⚠️ This channel is not ignored.").await
    }
}

/// Show current bad word filter settings.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let config = ctx
        .data()
        .filters
        .bad_words(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let mut embed = serenity::CreateEmbed::new()
        .title("🛡️ Bad Word Filter Status")
        .color(0x3498db)
        .field("Total Words", config.words.len().to_string(), true)
        .field(
            "Ignored Channels",
            config.ignored_channels.len().to_string(),
            true,
        );

    if !config.ignored_channels.is_empty() {
        let channels = config
            .ignored_channels
            .iter()
            .map(|id| format!("<#{id}>"))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("Ignored Channels List", channels, false);
    }

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
