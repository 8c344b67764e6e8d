// Discord adapter for the enforcement pipeline. Snapshots inbound messages
// into domain types, resolves the scope's policy, and carries out the
// platform side effects the pipeline orders.

use crate::core::filtering::{ActionResult, MessageSnapshot, PlatformActions};
use crate::discord::audit::ChannelAuditLogger;
use crate::discord::Data;
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long the link warning stays in the channel before it is removed.
const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Tracks the current reminder message per sticky channel so the previous
/// one can be deleted before a new one is posted.
#[derive(Default)]
pub struct StickyReminders {
    messages: DashMap<u64, u64>,
}

/// Run the enforcement pipeline for one inbound message.
pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<()> {
    // Skip bots (including ourselves) and DMs.
    if msg.author.bot {
        return Ok(());
    }
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    let in_thread = ctx
        .cache
        .channel(msg.channel_id)
        .map(|channel| channel.thread_metadata.is_some())
        .unwrap_or(false);

    // Prefer the guild nickname, then the global display name, like the
    // platform does.
    let display_name = msg
        .member
        .as_ref()
        .and_then(|member| member.nick.clone())
        .or_else(|| msg.author.global_name.clone())
        .unwrap_or_else(|| msg.author.name.clone());

    let snapshot = MessageSnapshot {
        message_id: msg.id.get(),
        guild_id: guild_id.get(),
        channel_id: msg.channel_id.get(),
        author_id: msg.author.id.get(),
        author_name: msg.author.name.clone(),
        author_display_name: display_name,
        author_avatar_url: msg.author.avatar_url(),
        author_role_ids: msg
            .member
            .as_ref()
            .map(|member| member.roles.iter().map(|role| role.get()).collect())
            .unwrap_or_default(),
        content: msg.content.clone(),
        attachment_count: msg.attachments.len(),
        in_thread,
    };

    let policy = data
        .filters
        .resolve_policy(snapshot.guild_id, snapshot.channel_id)
        .await?;

    let platform = SerenityPlatform {
        http: ctx.http.clone(),
        reminders: Arc::clone(&data.sticky_reminders),
    };
    let audit = ChannelAuditLogger::new(ctx.http.clone(), Arc::clone(&data.audit));

    data.pipeline
        .process(&snapshot, &policy, &platform, &audit, Instant::now())
        .await;

    Ok(())
}

/// Serenity-backed implementation of the pipeline's side-effect port.
struct SerenityPlatform {
    http: Arc<serenity::Http>,
    reminders: Arc<StickyReminders>,
}

#[async_trait]
impl PlatformActions for SerenityPlatform {
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> ActionResult {
        let result = serenity::ChannelId::new(channel_id)
            .delete_message(&self.http, serenity::MessageId::new(message_id))
            .await;
        to_action_result(result)
    }

    async fn send_transient_notice(&self, channel_id: u64, text: &str) -> ActionResult {
        let channel = serenity::ChannelId::new(channel_id);
        match channel.say(&self.http, text).await {
            Ok(notice) => {
                let http = Arc::clone(&self.http);
                tokio::spawn(async move {
                    tokio::time::sleep(NOTICE_TTL).await;
                    if let Err(error) = channel.delete_message(&http, notice.id).await {
                        tracing::debug!(%error, "failed to remove transient notice");
                    }
                });
                ActionResult::Ok
            }
            Err(error) => to_action_result::<()>(Err(error)),
        }
    }

    async fn create_discussion_thread(
        &self,
        channel_id: u64,
        message_id: u64,
        name: &str,
    ) -> ActionResult {
        let result = serenity::ChannelId::new(channel_id)
            .create_thread_from_message(
                &self.http,
                serenity::MessageId::new(message_id),
                serenity::CreateThread::new(name)
                    .auto_archive_duration(serenity::AutoArchiveDuration::OneDay),
            )
            .await;
        to_action_result(result)
    }

    async fn repost_sticky_reminder(&self, channel_id: u64, text: &str) -> ActionResult {
        let channel = serenity::ChannelId::new(channel_id);

        if let Some((_, previous)) = self.reminders.messages.remove(&channel_id) {
            if let Err(error) = channel
                .delete_message(&self.http, serenity::MessageId::new(previous))
                .await
            {
                tracing::debug!(%error, "failed to delete previous sticky reminder");
            }
        }

        match channel.say(&self.http, text).await {
            Ok(reminder) => {
                self.reminders.messages.insert(channel_id, reminder.id.get());
                ActionResult::Ok
            }
            Err(error) => to_action_result::<()>(Err(error)),
        }
    }
}

fn to_action_result<T>(result: Result<T, serenity::Error>) -> ActionResult {
    match result {
        Ok(_) => ActionResult::Ok,
        Err(error) if is_permission_error(&error) => ActionResult::Forbidden,
        Err(error) => ActionResult::TransientError(error.to_string()),
    }
}

fn is_permission_error(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response)) => {
            response.status_code.as_u16() == 403
        }
        _ => false,
    }
}
