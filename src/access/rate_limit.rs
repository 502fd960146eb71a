//! Sliding-window rate limiting for contact disclosure
//!
//! The limiter is injected behind [`ContactRateLimiter`] so a shared backend
//! can replace the in-process map in multi-instance deployments. The default
//! [`SlidingWindowLimiter`] is process-local: every instance enforces its
//! own ceiling.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::Actor;

/// Default disclosure attempts allowed per window
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Default sliding window length
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allow { remaining: u32 },
    Deny { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allow { .. })
    }
}

#[async_trait]
pub trait ContactRateLimiter: Send + Sync {
    /// Count an attempt for `key` if it fits in the window, otherwise deny.
    async fn check_and_record(&self, key: &str) -> RateDecision;
}

/// Key attempts by authenticated identity, falling back to network origin
pub fn rate_limit_key(actor: Option<&Actor>, origin: Option<&str>) -> String {
    match actor {
        Some(actor) => actor.id.to_string(),
        None => format!("ip:{}", origin.unwrap_or("unknown")),
    }
}

/// Per-key attempt timestamps within a trailing window
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    attempts: DashMap<String, VecDeque<Instant>>,
    max_attempts: usize,
    window: Duration,
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW)
    }
}

impl SlidingWindowLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts,
            window,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check-and-record at an explicit instant.
    ///
    /// The whole operation runs under the key's entry lock, so two callers
    /// racing on the same key cannot both observe a free slot.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut entry = self.attempts.entry(key.to_string()).or_default();
        let attempts = entry.value_mut();

        while let Some(&oldest) = attempts.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                attempts.pop_front();
            } else {
                break;
            }
        }

        if attempts.len() >= self.max_attempts {
            let oldest = attempts.front().copied().unwrap_or(now);
            let remaining = self.window.saturating_sub(now.saturating_duration_since(oldest));
            let retry_after_secs = remaining.as_millis().div_ceil(1000).max(1) as u64;
            debug!(key = %key, retry_after_secs, "Contact rate limit reached");
            return RateDecision::Deny { retry_after_secs };
        }

        attempts.push_back(now);
        RateDecision::Allow {
            remaining: (self.max_attempts - attempts.len()) as u32,
        }
    }

    /// Drop keys with no attempt inside the window (call periodically)
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    pub fn cleanup_at(&self, now: Instant) {
        self.attempts.retain(|_, attempts| {
            attempts
                .back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < self.window)
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.attempts.len()
    }
}

#[async_trait]
impl ContactRateLimiter for SlidingWindowLimiter {
    async fn check_and_record(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }
}
