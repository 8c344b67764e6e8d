// Audit logging - the delivery port and per-guild log-channel settings.
//
// The pipeline hands finished entries to an `AuditSink`; the Discord layer
// renders them as embeds. Delivery is strictly best-effort: an unset log
// channel or a failed send must never affect enforcement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// One formatted notification bound for a guild's log channel.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub guild_id: u64,
    pub title: String,
    pub body: String,
    pub actor_id: u64,
    pub actor_name: String,
    pub actor_avatar_url: Option<String>,
    /// Role mentioned outside the embed, e.g. the spam alert role.
    pub ping_role_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Delivery port. Implementations resolve the guild's configured log
/// destination, no-op when it is unset, and swallow delivery failures.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log(&self, entry: AuditEntry);
}

/// Persistence port for the guild -> log channel mapping.
#[async_trait]
pub trait AuditConfigStore: Send + Sync {
    async fn log_channel(&self, guild_id: u64) -> Result<Option<u64>, AuditError>;
    async fn set_log_channel(&self, guild_id: u64, channel_id: u64) -> Result<(), AuditError>;
    async fn reload(&self) -> Result<(), AuditError>;
}

pub struct AuditService<S: AuditConfigStore> {
    store: S,
}

impl<S: AuditConfigStore> AuditService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn log_channel(&self, guild_id: u64) -> Result<Option<u64>, AuditError> {
        self.store.log_channel(guild_id).await
    }

    pub async fn set_log_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<(), AuditError> {
        self.store.set_log_channel(guild_id, channel_id).await
    }

    pub async fn reload(&self) -> Result<(), AuditError> {
        self.store.reload().await
    }
}
