// The classifier chain. Each classifier is a pure evaluator over a message
// snapshot and the policy resolved for its scope; the enforcement pipeline
// owns ordering and side effects.

use super::filter_models::{FilterKind, FilterPolicy, MessageSnapshot, Verdict};
use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern for http(s) links, matched against lowercased content.
static LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("link pattern is valid"));

/// Symbols counted by the repeated-character spam check.
const FLOOD_SYMBOLS: &str = "!?@#$%^&*+=~`<>{}[]_|\\/";

/// Consecutive identical characters that count as a flood.
const FLOOD_RUN: usize = 6;

/// Everything a classifier may look at for one message.
pub struct Evaluation<'a> {
    pub message: &'a MessageSnapshot,
    pub policy: &'a FilterPolicy,
    /// Whether the author's recent-message window is full of identical
    /// entries. Computed by the pipeline after history is recorded.
    pub history_uniform: bool,
}

pub trait Classifier: Send + Sync {
    fn kind(&self) -> FilterKind;
    fn classify(&self, eval: &Evaluation<'_>) -> Verdict;
}

/// The chain in enforcement priority order.
pub fn default_chain() -> Vec<Box<dyn Classifier>> {
    vec![
        Box::new(BadWordClassifier),
        Box::new(LinkClassifier),
        Box::new(SpamClassifier),
        Box::new(StickyPostClassifier),
    ]
}

/// Rejects messages containing any configured word as a case-insensitive
/// substring, outside the ignored channels.
pub struct BadWordClassifier;

impl Classifier for BadWordClassifier {
    fn kind(&self) -> FilterKind {
        FilterKind::BadWord
    }

    fn classify(&self, eval: &Evaluation<'_>) -> Verdict {
        let config = &eval.policy.bad_words;
        if config.ignored_channels.contains(&eval.message.channel_id) {
            return Verdict::Allow;
        }

        let content = eval.message.content.to_lowercase();
        for word in &config.words {
            if !word.is_empty() && content.contains(&word.to_lowercase()) {
                return Verdict::Reject {
                    reason: format!("contains the blocked word `{word}`"),
                };
            }
        }
        Verdict::Allow
    }
}

/// Rejects the first link whose domain is not whitelisted for the channel.
/// Authors holding a whitelisted role bypass the check entirely.
pub struct LinkClassifier;

impl Classifier for LinkClassifier {
    fn kind(&self) -> FilterKind {
        FilterKind::Link
    }

    fn classify(&self, eval: &Evaluation<'_>) -> Verdict {
        let Some(config) = eval.policy.link.as_ref() else {
            return Verdict::Allow;
        };
        if !config.enabled {
            return Verdict::Allow;
        }
        if eval
            .message
            .author_role_ids
            .iter()
            .any(|role| config.whitelisted_roles.contains(role))
        {
            return Verdict::Allow;
        }

        let content = eval.message.content.to_lowercase();
        for found in LINK_PATTERN.find_iter(&content) {
            let link = found.as_str();
            let whitelisted = config
                .whitelisted_domains
                .iter()
                .any(|domain| link.contains(&domain.to_lowercase()));
            if !whitelisted {
                return Verdict::Reject {
                    reason: link.to_string(),
                };
            }
        }
        Verdict::Allow
    }
}

/// Heuristic spam checks: repeated identical lines, character floods, and a
/// history window full of the same message.
pub struct SpamClassifier;

impl Classifier for SpamClassifier {
    fn kind(&self) -> FilterKind {
        FilterKind::Spam
    }

    fn classify(&self, eval: &Evaluation<'_>) -> Verdict {
        let config = &eval.policy.spam;
        if !config.enabled || config.ignored_channels.contains(&eval.message.channel_id) {
            return Verdict::Allow;
        }

        let content = &eval.message.content;

        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() >= 3 && lines.iter().all(|line| *line == lines[0]) {
            return Verdict::Reject {
                reason: "repeated identical lines".to_string(),
            };
        }

        if has_character_flood(content) {
            return Verdict::Reject {
                reason: "repeated character flood".to_string(),
            };
        }

        if eval.history_uniform {
            return Verdict::Reject {
                reason: "same message sent repeatedly".to_string(),
            };
        }

        Verdict::Allow
    }
}

/// A run of six or more identical letters or symbols. Letter runs are
/// case-sensitive, so "aaaAAA" is not a flood.
fn has_character_flood(content: &str) -> bool {
    let mut run = 0usize;
    let mut prev = None;
    for c in content.chars() {
        if prev == Some(c) {
            run += 1;
        } else {
            run = 1;
            prev = Some(c);
        }
        if run >= FLOOD_RUN && (c.is_ascii_alphabetic() || FLOOD_SYMBOLS.contains(c)) {
            return true;
        }
    }
    false
}

/// In sticky channels, top-level posts must carry an attachment or a link.
/// Thread messages are exempt.
pub struct StickyPostClassifier;

impl Classifier for StickyPostClassifier {
    fn kind(&self) -> FilterKind {
        FilterKind::StickyPost
    }

    fn classify(&self, eval: &Evaluation<'_>) -> Verdict {
        let message = eval.message;
        if message.in_thread || !eval.policy.sticky.is_sticky(message.channel_id) {
            return Verdict::Allow;
        }
        if message.attachment_count > 0 {
            return Verdict::Allow;
        }
        let content = message.content.to_lowercase();
        if content.contains("http://") || content.contains("https://") {
            return Verdict::Allow;
        }
        Verdict::Reject {
            reason: "not an image or link".to_string(),
        }
    }
}
