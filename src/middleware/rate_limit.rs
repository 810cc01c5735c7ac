//! Rate limiting middleware
//!
//! Fixed-window per-chat request counter. Best-effort abuse mitigation,
//! not a security control: state is in-memory and lost on restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::RateLimitConfig;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// True only on the first rejection in a window, so the warning is
    /// sent once and later rejections in the same window stay silent.
    pub should_warn: bool,
}

const ALLOW: RateDecision = RateDecision { allowed: true, should_warn: false };

#[derive(Debug, Clone)]
struct WindowEntry {
    window_start: Instant,
    count: u32,
    warned: bool,
}

/// Fixed-window rate limiter keyed by chat id.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Arc<Mutex<HashMap<i64, WindowEntry>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_seconds),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check whether a request from `chat_id` is allowed right now.
    pub fn allow(&self, chat_id: i64) -> RateDecision {
        self.allow_at(chat_id, Instant::now())
    }

    /// Clock-injectable variant of [`RateLimiter::allow`].
    pub fn allow_at(&self, chat_id: i64, now: Instant) -> RateDecision {
        let mut entries = self.entries.lock().expect("rate limiter lock poisoned");

        let entry = match entries.get_mut(&chat_id) {
            Some(entry) => entry,
            None => {
                entries.insert(chat_id, WindowEntry { window_start: now, count: 1, warned: false });
                return ALLOW;
            }
        };

        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 1;
            entry.warned = false;
            return ALLOW;
        }

        if entry.count >= self.max_requests {
            if entry.warned {
                return RateDecision { allowed: false, should_warn: false };
            }
            entry.warned = true;
            debug!(chat_id = chat_id, "Rate limit exceeded, warning once");
            return RateDecision { allowed: false, should_warn: true };
        }

        entry.count += 1;
        ALLOW
    }
}
