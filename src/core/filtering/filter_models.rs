// Filtering domain models - shared types for the moderation pipeline.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts between these and serenity types.

use serde::{Deserialize, Serialize};

/// Which filter produced a verdict. Enforcement order is decided by the
/// pipeline, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    BadWord,
    Link,
    Spam,
    StickyPost,
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterKind::BadWord => write!(f, "Bad Word"),
            FilterKind::Link => write!(f, "Link"),
            FilterKind::Spam => write!(f, "Spam"),
            FilterKind::StickyPost => write!(f, "Sticky Post"),
        }
    }
}

/// Outcome of classifying one message against one policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Allow,
    Reject { reason: String },
}

/// Platform-agnostic view of an inbound guild message.
#[derive(Debug, Clone)]
pub struct MessageSnapshot {
    pub message_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub author_display_name: String,
    pub author_avatar_url: Option<String>,
    pub author_role_ids: Vec<u64>,
    pub content: String,
    pub attachment_count: usize,
    /// Posts inside threads are exempt from sticky enforcement.
    pub in_thread: bool,
}

/// Guild-wide bad word list and the channels it skips.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BadWordConfig {
    /// Stored lowercase, matched as case-insensitive substrings.
    pub words: Vec<String>,
    pub ignored_channels: Vec<u64>,
}

/// Per-channel link filter settings. An absent document means the filter is
/// off for that channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkChannelConfig {
    pub enabled: bool,
    /// Lowercase domain fragments; a link passes when any fragment is a
    /// substring of it.
    pub whitelisted_domains: Vec<String>,
    /// Members holding any of these roles bypass the filter entirely.
    pub whitelisted_roles: Vec<u64>,
}

/// Guild-wide spam filter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpamConfig {
    pub enabled: bool,
    pub ignored_channels: Vec<u64>,
    /// Role pinged in the audit entry when a spam message is removed.
    pub alert_role_id: Option<u64>,
}

/// Channels where every top-level post must carry a link or attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StickyConfig {
    pub channels: Vec<u64>,
}

impl StickyConfig {
    pub fn is_sticky(&self, channel_id: u64) -> bool {
        self.channels.contains(&channel_id)
    }
}

/// Every feature's settings for the scope a message arrived in, resolved
/// once per message by the filter service.
#[derive(Debug, Clone, Default)]
pub struct FilterPolicy {
    pub bad_words: BadWordConfig,
    pub link: Option<LinkChannelConfig>,
    pub spam: SpamConfig,
    pub sticky: StickyConfig,
}

/// Result of a single platform call made by the pipeline. Platform wrappers
/// translate permission failures into `Forbidden` instead of bubbling them
/// up as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    Ok,
    Forbidden,
    TransientError(String),
}
