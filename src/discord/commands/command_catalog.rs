// Discord commands module.
// Each feature gets its own command file.

pub mod bad_words;
pub mod link_filter;
pub mod settings;
pub mod spam_filter;
pub mod sticky;

use crate::core::audit::AuditService;
use crate::core::filtering::{EnforcementPipeline, FilterService};
use crate::discord::filtering::StickyReminders;
use crate::infra::audit::JsonAuditStore;
use crate::infra::filtering::JsonFilterStore;
use std::sync::Arc;

/// Shared state injected into every command and event handler.
pub struct Data {
    pub filters: Arc<FilterService<JsonFilterStore>>,
    pub pipeline: Arc<EnforcementPipeline>,
    pub audit: Arc<AuditService<JsonAuditStore>>,
    pub sticky_reminders: Arc<StickyReminders>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Configuration replies are ephemeral so channels stay clean.
pub(crate) async fn reply_ephemeral(
    ctx: Context<'_>,
    text: impl Into<String>,
) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(text.into())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
