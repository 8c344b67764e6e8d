// Renders audit entries as embeds in the guild's configured log channel.
//
// Delivery is best-effort throughout: an unset channel, a missing
// destination, or a permission failure only produces a console warning.

use crate::core::audit::{AuditEntry, AuditService, AuditSink};
use crate::infra::audit::JsonAuditStore;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Embed color shared by all audit entries.
const AUDIT_COLOR: u32 = 0xff9f43;

pub struct ChannelAuditLogger {
    http: Arc<serenity::Http>,
    service: Arc<AuditService<JsonAuditStore>>,
}

impl ChannelAuditLogger {
    pub fn new(http: Arc<serenity::Http>, service: Arc<AuditService<JsonAuditStore>>) -> Self {
        Self { http, service }
    }
}

#[async_trait]
impl AuditSink for ChannelAuditLogger {
    async fn log(&self, entry: AuditEntry) {
        let channel_id = match self.service.log_channel(entry.guild_id).await {
            Ok(Some(id)) => id,
            Ok(None) => return,
            Err(error) => {
                tracing::warn!(%error, guild_id = entry.guild_id, "failed to look up log channel");
                return;
            }
        };

        let mut footer = serenity::CreateEmbedFooter::new(format!(
            "{} ({})",
            entry.actor_name, entry.actor_id
        ));
        if let Some(url) = entry.actor_avatar_url.clone() {
            footer = footer.icon_url(url);
        }

        let timestamp = serenity::Timestamp::from_unix_timestamp(entry.created_at.timestamp())
            .unwrap_or_else(|_| serenity::Timestamp::now());

        let embed = serenity::CreateEmbed::new()
            .title(entry.title.clone())
            .description(entry.body.clone())
            .color(AUDIT_COLOR)
            .timestamp(timestamp)
            .footer(footer);

        let mut message = serenity::CreateMessage::new().embed(embed);
        if let Some(role_id) = entry.ping_role_id {
            // Ping lands outside the embed so the mention actually fires.
            message = message.content(format!("<@&{role_id}>"));
        }

        if let Err(error) = serenity::ChannelId::new(channel_id)
            .send_message(&self.http, message)
            .await
        {
            tracing::warn!(%error, guild_id = entry.guild_id, "failed to deliver audit entry");
        }
    }
}
