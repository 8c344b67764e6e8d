// Enforcement pipeline - runs the classifier chain over each inbound guild
// message and performs the side effects for the first reject.
//
// The original registered each filter as an independent listener, so one
// message could be deleted and audited more than once. Here the chain is
// evaluated in a fixed order and exactly one enforcement action runs.

use super::classifiers::{default_chain, Classifier, Evaluation};
use super::filter_models::{ActionResult, FilterKind, FilterPolicy, MessageSnapshot, Verdict};
use super::user_state::{MessageHistory, RateLimiter};
use crate::core::audit::{AuditEntry, AuditSink};
use async_trait::async_trait;
use chrono::Utc;
use std::time::{Duration, Instant};

/// Cooldown between spam enforcement actions for one user.
pub const SPAM_COOLDOWN: Duration = Duration::from_secs(10);

/// Recent messages kept per user for the repeated-message check.
const HISTORY_WINDOW: usize = 5;

/// Longest content excerpt quoted in a spam audit entry.
const SPAM_EXCERPT_CHARS: usize = 300;

/// How long a user's history window survives without new messages before the
/// background sweep drops it.
const HISTORY_IDLE: Duration = Duration::from_secs(30 * 60);

/// Reminder posted after every handled message in a sticky channel.
pub const STICKY_REMINDER: &str = "📌 **PLEASE DO NOT TEXT HERE , IT IS POST ONLY CHANNEL .**\n\
    ONLY LINKS AND ADJUSTMENTS ARE ALLOWED TO BE POSTED , CHAT IN THREAD LINKED TO EVERY POST .";

/// Platform side effects the pipeline may order. Implementations translate
/// permission failures into `ActionResult::Forbidden` rather than errors.
#[async_trait]
pub trait PlatformActions: Send + Sync {
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> ActionResult;

    /// Post a short-lived notice in the channel, removed after a few seconds.
    async fn send_transient_notice(&self, channel_id: u64, text: &str) -> ActionResult;

    /// Open a discussion thread on a message.
    async fn create_discussion_thread(
        &self,
        channel_id: u64,
        message_id: u64,
        name: &str,
    ) -> ActionResult;

    /// Replace the channel's standing reminder with a fresh copy, removing
    /// the previous one first.
    async fn repost_sticky_reminder(&self, channel_id: u64, text: &str) -> ActionResult;
}

/// What the pipeline did with one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every classifier allowed the message.
    Clean,
    /// A classifier rejected and the enforcement action ran.
    Enforced(FilterKind),
    /// A classifier rejected but the author's cooldown suppressed the action.
    Suppressed(FilterKind),
}

pub struct EnforcementPipeline {
    classifiers: Vec<Box<dyn Classifier>>,
    spam_cooldown: RateLimiter,
    history: MessageHistory,
}

impl EnforcementPipeline {
    pub fn new() -> Self {
        Self {
            classifiers: default_chain(),
            spam_cooldown: RateLimiter::new(SPAM_COOLDOWN),
            history: MessageHistory::new(HISTORY_WINDOW),
        }
    }

    /// Drop cooldown and history entries that have gone idle. Called from a
    /// background task.
    pub fn sweep_user_state(&self, now: Instant) {
        self.spam_cooldown.sweep_expired(now);
        self.history.sweep_idle(now, HISTORY_IDLE);
    }

    pub async fn process(
        &self,
        message: &MessageSnapshot,
        policy: &FilterPolicy,
        platform: &dyn PlatformActions,
        audit: &dyn AuditSink,
        now: Instant,
    ) -> PipelineOutcome {
        // History feeds the repeat check and must include the current message
        // before classification runs, whatever the verdict ends up being.
        self.history.record(message.author_id, &message.content, now);

        let eval = Evaluation {
            message,
            policy,
            history_uniform: self.history.is_uniform_repeat(message.author_id),
        };

        let rejection = self
            .classifiers
            .iter()
            .find_map(|classifier| match classifier.classify(&eval) {
                Verdict::Allow => None,
                Verdict::Reject { reason } => Some((classifier.kind(), reason)),
            });

        let Some((kind, reason)) = rejection else {
            if !message.in_thread && policy.sticky.is_sticky(message.channel_id) {
                self.accept_sticky_post(message, platform).await;
            }
            return PipelineOutcome::Clean;
        };

        tracing::info!(
            filter = %kind,
            user_id = message.author_id,
            channel_id = message.channel_id,
            %reason,
            "message rejected"
        );

        match kind {
            FilterKind::BadWord => self.enforce_bad_word(message, platform, audit).await,
            FilterKind::Link => self.enforce_link(message, &reason, platform, audit).await,
            FilterKind::Spam => {
                if self.spam_cooldown.is_on_cooldown(message.author_id, now) {
                    tracing::debug!(
                        user_id = message.author_id,
                        "spam action suppressed by cooldown"
                    );
                    return PipelineOutcome::Suppressed(kind);
                }
                self.enforce_spam(message, policy, platform, audit, now).await
            }
            FilterKind::StickyPost => self.enforce_sticky(message, platform, audit).await,
        }

        PipelineOutcome::Enforced(kind)
    }

    async fn enforce_bad_word(
        &self,
        message: &MessageSnapshot,
        platform: &dyn PlatformActions,
        audit: &dyn AuditSink,
    ) {
        if !self.delete(message, platform, FilterKind::BadWord).await {
            return;
        }

        audit
            .log(entry(
                message,
                "Bad Word Detected",
                format!(
                    "🚫 **Message by <@{}> deleted in <#{}>**\n{}",
                    message.author_id, message.channel_id, message.content
                ),
                None,
            ))
            .await;
    }

    async fn enforce_link(
        &self,
        message: &MessageSnapshot,
        link: &str,
        platform: &dyn PlatformActions,
        audit: &dyn AuditSink,
    ) {
        if !self.delete(message, platform, FilterKind::Link).await {
            return;
        }

        let notice = format!(
            "🚫 <@{}>, links are not allowed in this channel.",
            message.author_id
        );
        if let ActionResult::TransientError(error) = platform
            .send_transient_notice(message.channel_id, &notice)
            .await
        {
            tracing::warn!(%error, "failed to send link warning");
        }

        audit
            .log(entry(
                message,
                "🔗 Link Blocked",
                format!(
                    "**User:** <@{}> (`{}`)\n**Channel:** <#{}>\n**Message:** `{}`",
                    message.author_id, message.author_id, message.channel_id, link
                ),
                None,
            ))
            .await;
    }

    async fn enforce_spam(
        &self,
        message: &MessageSnapshot,
        policy: &FilterPolicy,
        platform: &dyn PlatformActions,
        audit: &dyn AuditSink,
        now: Instant,
    ) {
        if !self.delete(message, platform, FilterKind::Spam).await {
            return;
        }

        let excerpt: String = message.content.chars().take(SPAM_EXCERPT_CHARS).collect();
        audit
            .log(entry(
                message,
                "🚨 Spam Message Deleted",
                format!(
                    "**Author:** <@{}> (`{}`)\n**Channel:** <#{}>\n**Content:**\n```{}```",
                    message.author_id, message.author_id, message.channel_id, excerpt
                ),
                policy.spam.alert_role_id,
            ))
            .await;

        self.spam_cooldown.record_action(message.author_id, now);
    }

    async fn enforce_sticky(
        &self,
        message: &MessageSnapshot,
        platform: &dyn PlatformActions,
        audit: &dyn AuditSink,
    ) {
        if self.delete(message, platform, FilterKind::StickyPost).await {
            audit
                .log(entry(
                    message,
                    "Sticky Channel Violation",
                    format!(
                        "🗑️ **Message by <@{}> deleted in <#{}>** (Not an image or link)\n{}",
                        message.author_id, message.channel_id, message.content
                    ),
                    None,
                ))
                .await;
        }

        self.post_reminder(message.channel_id, platform).await;
    }

    /// A valid post in a sticky channel gets a discussion thread, and the
    /// standing reminder moves below it.
    async fn accept_sticky_post(&self, message: &MessageSnapshot, platform: &dyn PlatformActions) {
        let name = format!("Discussion with {}", message.author_display_name);
        match platform
            .create_discussion_thread(message.channel_id, message.message_id, &name)
            .await
        {
            ActionResult::Ok => {}
            ActionResult::Forbidden => {
                tracing::warn!(
                    channel_id = message.channel_id,
                    "missing permission to create discussion thread"
                );
            }
            ActionResult::TransientError(error) => {
                tracing::warn!(%error, "failed to create discussion thread");
            }
        }

        self.post_reminder(message.channel_id, platform).await;
    }

    async fn post_reminder(&self, channel_id: u64, platform: &dyn PlatformActions) {
        match platform
            .repost_sticky_reminder(channel_id, STICKY_REMINDER)
            .await
        {
            ActionResult::Ok => {}
            ActionResult::Forbidden => {
                tracing::warn!(channel_id, "missing permission to post sticky reminder");
            }
            ActionResult::TransientError(error) => {
                tracing::warn!(%error, "failed to post sticky reminder");
            }
        }
    }

    /// Delete the offending message. Returns `true` on success; a forbidden
    /// or failed delete skips the audit entry.
    async fn delete(
        &self,
        message: &MessageSnapshot,
        platform: &dyn PlatformActions,
        kind: FilterKind,
    ) -> bool {
        match platform
            .delete_message(message.channel_id, message.message_id)
            .await
        {
            ActionResult::Ok => true,
            ActionResult::Forbidden => {
                tracing::warn!(
                    filter = %kind,
                    channel_id = message.channel_id,
                    "missing permission to delete message"
                );
                false
            }
            ActionResult::TransientError(error) => {
                tracing::warn!(filter = %kind, %error, "failed to delete message");
                false
            }
        }
    }
}

impl Default for EnforcementPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn entry(
    message: &MessageSnapshot,
    title: &str,
    body: String,
    ping_role_id: Option<u64>,
) -> AuditEntry {
    AuditEntry {
        guild_id: message.guild_id,
        title: title.to_string(),
        body,
        actor_id: message.author_id,
        actor_name: message.author_name.clone(),
        actor_avatar_url: message.author_avatar_url.clone(),
        ping_role_id,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filtering::filter_models::{
        BadWordConfig, LinkChannelConfig, SpamConfig, StickyConfig,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockPlatform {
        deletes: Mutex<Vec<(u64, u64)>>,
        notices: Mutex<Vec<String>>,
        threads: Mutex<Vec<String>>,
        reminders: Mutex<Vec<u64>>,
        forbid_deletes: bool,
    }

    #[async_trait]
    impl PlatformActions for MockPlatform {
        async fn delete_message(&self, channel_id: u64, message_id: u64) -> ActionResult {
            if self.forbid_deletes {
                return ActionResult::Forbidden;
            }
            self.deletes.lock().unwrap().push((channel_id, message_id));
            ActionResult::Ok
        }

        async fn send_transient_notice(&self, _channel_id: u64, text: &str) -> ActionResult {
            self.notices.lock().unwrap().push(text.to_string());
            ActionResult::Ok
        }

        async fn create_discussion_thread(
            &self,
            _channel_id: u64,
            _message_id: u64,
            name: &str,
        ) -> ActionResult {
            self.threads.lock().unwrap().push(name.to_string());
            ActionResult::Ok
        }

        async fn repost_sticky_reminder(&self, channel_id: u64, _text: &str) -> ActionResult {
            self.reminders.lock().unwrap().push(channel_id);
            ActionResult::Ok
        }
    }

    #[derive(Default)]
    struct MockAudit {
        entries: Mutex<Vec<AuditEntry>>,
    }

    #[async_trait]
    impl AuditSink for MockAudit {
        async fn log(&self, entry: AuditEntry) {
            self.entries.lock().unwrap().push(entry);
        }
    }

    fn snapshot(content: &str) -> MessageSnapshot {
        MessageSnapshot {
            message_id: 1,
            guild_id: 100,
            channel_id: 200,
            author_id: 300,
            author_name: "tester".to_string(),
            author_display_name: "Tester".to_string(),
            author_avatar_url: None,
            author_role_ids: Vec::new(),
            content: content.to_string(),
            attachment_count: 0,
            in_thread: false,
        }
    }

    fn bad_word_policy() -> FilterPolicy {
        FilterPolicy {
            bad_words: BadWordConfig {
                words: vec!["spam".to_string()],
                ignored_channels: Vec::new(),
            },
            ..Default::default()
        }
    }

    fn spam_policy() -> FilterPolicy {
        FilterPolicy {
            spam: SpamConfig {
                enabled: true,
                ignored_channels: Vec::new(),
                alert_role_id: Some(77),
            },
            ..Default::default()
        }
    }

    fn sticky_policy() -> FilterPolicy {
        FilterPolicy {
            sticky: StickyConfig {
                channels: vec![200],
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn clean_message_touches_nothing() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();

        let outcome = pipeline
            .process(
                &snapshot("hello there"),
                &FilterPolicy::default(),
                &platform,
                &audit,
                Instant::now(),
            )
            .await;

        assert_eq!(outcome, PipelineOutcome::Clean);
        assert!(platform.deletes.lock().unwrap().is_empty());
        assert!(audit.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_word_message_is_deleted_and_audited() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();

        let outcome = pipeline
            .process(
                &snapshot("this is SPAM"),
                &bad_word_policy(),
                &platform,
                &audit,
                Instant::now(),
            )
            .await;

        assert_eq!(outcome, PipelineOutcome::Enforced(FilterKind::BadWord));
        assert_eq!(platform.deletes.lock().unwrap().as_slice(), &[(200, 1)]);

        let entries = audit.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].guild_id, 100);
        assert_eq!(entries[0].actor_id, 300);
        assert_eq!(entries[0].title, "Bad Word Detected");
        assert!(entries[0].body.contains("<#200>"));
    }

    #[tokio::test]
    async fn forbidden_delete_skips_the_audit_entry() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform {
            forbid_deletes: true,
            ..Default::default()
        };
        let audit = MockAudit::default();

        let outcome = pipeline
            .process(
                &snapshot("this is spam"),
                &bad_word_policy(),
                &platform,
                &audit,
                Instant::now(),
            )
            .await;

        assert_eq!(outcome, PipelineOutcome::Enforced(FilterKind::BadWord));
        assert!(audit.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_word_wins_over_link_when_both_match() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();

        let mut policy = bad_word_policy();
        policy.link = Some(LinkChannelConfig {
            enabled: true,
            whitelisted_domains: Vec::new(),
            whitelisted_roles: Vec::new(),
        });

        let outcome = pipeline
            .process(
                &snapshot("spam https://evil.example/x"),
                &policy,
                &platform,
                &audit,
                Instant::now(),
            )
            .await;

        assert_eq!(outcome, PipelineOutcome::Enforced(FilterKind::BadWord));
        assert_eq!(platform.deletes.lock().unwrap().len(), 1);
        assert_eq!(audit.entries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blocked_link_gets_notice_and_audit_with_the_link() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();

        let policy = FilterPolicy {
            link: Some(LinkChannelConfig {
                enabled: true,
                whitelisted_domains: vec!["youtube.com".to_string()],
                whitelisted_roles: Vec::new(),
            }),
            ..Default::default()
        };

        let outcome = pipeline
            .process(
                &snapshot("https://youtube.com/ok https://evil.example/x"),
                &policy,
                &platform,
                &audit,
                Instant::now(),
            )
            .await;

        assert_eq!(outcome, PipelineOutcome::Enforced(FilterKind::Link));
        assert_eq!(platform.notices.lock().unwrap().len(), 1);

        let entries = audit.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].body.contains("evil.example"));
        assert!(!entries[0].body.contains("youtube.com"));
    }

    #[tokio::test]
    async fn spam_cooldown_suppresses_the_second_action() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();
        let policy = spam_policy();
        let start = Instant::now();

        let first = pipeline
            .process(&snapshot("!!!!!!"), &policy, &platform, &audit, start)
            .await;
        assert_eq!(first, PipelineOutcome::Enforced(FilterKind::Spam));

        let second = pipeline
            .process(
                &snapshot("!!!!!!"),
                &policy,
                &platform,
                &audit,
                start + Duration::from_secs(5),
            )
            .await;
        assert_eq!(second, PipelineOutcome::Suppressed(FilterKind::Spam));

        assert_eq!(platform.deletes.lock().unwrap().len(), 1);
        assert_eq!(audit.entries.lock().unwrap().len(), 1);

        let third = pipeline
            .process(
                &snapshot("!!!!!!"),
                &policy,
                &platform,
                &audit,
                start + Duration::from_secs(11),
            )
            .await;
        assert_eq!(third, PipelineOutcome::Enforced(FilterKind::Spam));
        assert_eq!(platform.deletes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn spam_audit_carries_alert_role_and_truncated_excerpt() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();

        let long_flood = "x".repeat(400) + "!!!!!!";
        pipeline
            .process(
                &snapshot(&long_flood),
                &spam_policy(),
                &platform,
                &audit,
                Instant::now(),
            )
            .await;

        let entries = audit.entries.lock().unwrap();
        assert_eq!(entries[0].ping_role_id, Some(77));
        assert!(!entries[0].body.contains("!!!!!!"));
    }

    #[tokio::test]
    async fn repeated_history_is_enforced_on_the_fifth_message() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();
        let policy = spam_policy();
        let start = Instant::now();

        for i in 0..4 {
            let outcome = pipeline
                .process(
                    &snapshot("same message"),
                    &policy,
                    &platform,
                    &audit,
                    start + Duration::from_secs(20 * i),
                )
                .await;
            assert_eq!(outcome, PipelineOutcome::Clean);
        }

        let fifth = pipeline
            .process(
                &snapshot("same message"),
                &policy,
                &platform,
                &audit,
                start + Duration::from_secs(100),
            )
            .await;
        assert_eq!(fifth, PipelineOutcome::Enforced(FilterKind::Spam));
    }

    #[tokio::test]
    async fn history_keeps_recording_through_an_active_cooldown() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();
        let policy = spam_policy();
        let start = Instant::now();

        for i in 0..4u64 {
            let outcome = pipeline
                .process(
                    &snapshot("again"),
                    &policy,
                    &platform,
                    &audit,
                    start + Duration::from_secs(i),
                )
                .await;
            assert_eq!(outcome, PipelineOutcome::Clean);
        }

        // A flood starts the cooldown and pushes one odd entry into the
        // author's window.
        let flood = pipeline
            .process(
                &snapshot("!!!!!!"),
                &policy,
                &platform,
                &audit,
                start + Duration::from_secs(4),
            )
            .await;
        assert_eq!(flood, PipelineOutcome::Enforced(FilterKind::Spam));

        // Four clean repeats refill the window while the cooldown runs; the
        // fifth makes it uniform again, and only the cooldown holds the
        // action back.
        for i in 5..9u64 {
            let outcome = pipeline
                .process(
                    &snapshot("again"),
                    &policy,
                    &platform,
                    &audit,
                    start + Duration::from_secs(i),
                )
                .await;
            assert_eq!(outcome, PipelineOutcome::Clean);
        }
        let ninth = pipeline
            .process(
                &snapshot("again"),
                &policy,
                &platform,
                &audit,
                start + Duration::from_secs(9),
            )
            .await;
        assert_eq!(ninth, PipelineOutcome::Suppressed(FilterKind::Spam));

        // Once the cooldown lapses the still-uniform window is enforced.
        let later = pipeline
            .process(
                &snapshot("again"),
                &policy,
                &platform,
                &audit,
                start + Duration::from_secs(20),
            )
            .await;
        assert_eq!(later, PipelineOutcome::Enforced(FilterKind::Spam));
        assert_eq!(platform.deletes.lock().unwrap().len(), 2);
        assert_eq!(audit.entries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sticky_violation_is_deleted_audited_and_reminded() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();

        let outcome = pipeline
            .process(
                &snapshot("just chatting"),
                &sticky_policy(),
                &platform,
                &audit,
                Instant::now(),
            )
            .await;

        assert_eq!(outcome, PipelineOutcome::Enforced(FilterKind::StickyPost));
        assert_eq!(platform.deletes.lock().unwrap().len(), 1);
        assert_eq!(platform.reminders.lock().unwrap().as_slice(), &[200]);

        let entries = audit.entries.lock().unwrap();
        assert_eq!(entries[0].title, "Sticky Channel Violation");
    }

    #[tokio::test]
    async fn valid_sticky_post_gets_a_thread_and_reminder() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();

        let mut message = snapshot("fresh drop");
        message.attachment_count = 1;

        let outcome = pipeline
            .process(&message, &sticky_policy(), &platform, &audit, Instant::now())
            .await;

        assert_eq!(outcome, PipelineOutcome::Clean);
        assert!(platform.deletes.lock().unwrap().is_empty());
        assert_eq!(
            platform.threads.lock().unwrap().as_slice(),
            &["Discussion with Tester".to_string()]
        );
        assert_eq!(platform.reminders.lock().unwrap().as_slice(), &[200]);
        assert!(audit.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn thread_messages_do_not_trigger_sticky_side_effects() {
        let pipeline = EnforcementPipeline::new();
        let platform = MockPlatform::default();
        let audit = MockAudit::default();

        let mut message = snapshot("chatting in the thread");
        message.in_thread = true;

        let outcome = pipeline
            .process(&message, &sticky_policy(), &platform, &audit, Instant::now())
            .await;

        assert_eq!(outcome, PipelineOutcome::Clean);
        assert!(platform.threads.lock().unwrap().is_empty());
        assert!(platform.reminders.lock().unwrap().is_empty());
    }
}
