// Ephemeral per-user state for the spam filter: cooldown timestamps and a
// rolling window of recent message text. Nothing here is persisted.
//
// Callers pass `now` explicitly so the windows can be exercised in tests
// without sleeping.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Cap on distinct users tracked per map so state cannot grow without bound
/// over a long-running process.
const MAX_TRACKED_USERS: usize = 10_000;

/// Per-user cooldown gate between repeated enforcement actions.
pub struct RateLimiter {
    window: Duration,
    last_action: DashMap<u64, Instant>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_action: DashMap::new(),
        }
    }

    pub fn is_on_cooldown(&self, user_id: u64, now: Instant) -> bool {
        self.last_action
            .get(&user_id)
            .map(|last| now.duration_since(*last) < self.window)
            .unwrap_or(false)
    }

    pub fn record_action(&self, user_id: u64, now: Instant) {
        self.last_action.insert(user_id, now);

        if self.last_action.len() > MAX_TRACKED_USERS {
            self.sweep_expired(now);
        }
    }

    /// Drop entries whose window has already elapsed.
    pub fn sweep_expired(&self, now: Instant) {
        self.last_action
            .retain(|_, last| now.duration_since(*last) < self.window);
    }
}

/// Rolling window of each user's recent messages, normalized to trimmed
/// lowercase. Used only by the repeated-message spam check.
pub struct MessageHistory {
    capacity: usize,
    entries: DashMap<u64, (Instant, VecDeque<String>)>,
}

impl MessageHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: DashMap::new(),
        }
    }

    pub fn record(&self, user_id: u64, content: &str, now: Instant) {
        let normalized = content.trim().to_lowercase();

        {
            let mut entry = self
                .entries
                .entry(user_id)
                .or_insert_with(|| (now, VecDeque::with_capacity(self.capacity)));
            entry.0 = now;
            if entry.1.len() == self.capacity {
                entry.1.pop_front();
            }
            entry.1.push_back(normalized);
        }

        if self.entries.len() > MAX_TRACKED_USERS {
            // Evict the user who has been quiet the longest.
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| e.value().0)
                .map(|e| *e.key());
            if let Some(key) = oldest {
                self.entries.remove(&key);
            }
        }
    }

    /// True only when the window is full and every entry is identical.
    pub fn is_uniform_repeat(&self, user_id: u64) -> bool {
        self.entries
            .get(&user_id)
            .map(|entry| {
                let window = &entry.1;
                window.len() == self.capacity && window.iter().all(|m| m == &window[0])
            })
            .unwrap_or(false)
    }

    /// Drop windows for users who have not posted within `max_idle`.
    pub fn sweep_idle(&self, now: Instant, max_idle: Duration) {
        self.entries
            .retain(|_, (last_seen, _)| now.duration_since(*last_seen) < max_idle);
    }
}
