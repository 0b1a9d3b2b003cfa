//! Sliding-window admission control for link creation.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};

/// Default number of creation requests allowed per window.
pub const DEFAULT_MAX_REQUESTS: usize = 5;

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECONDS: i64 = 60;

/// In-process sliding-window rate limiter keyed by client identity.
///
/// Each key owns a ring of at most `max_requests` timestamps. Pruning, counting and
/// recording happen under the key's map-entry lock, so concurrent requests from the
/// same client cannot undercount.
///
/// Keys whose timestamps have all left the window are dropped at most once per window
/// from inside [`RateLimiter::check_and_record`], so the table stays bounded by the
/// clients seen in roughly the last two windows without an external sweep.
///
/// State lives only in memory and is not shared between processes.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    entries: DashMap<String, VecDeque<DateTime<Utc>>>,
    /// Millisecond timestamp of the last idle-key pass; `i64::MIN` before the first.
    last_pruned_ms: AtomicI64,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window`.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: DashMap::new(),
            last_pruned_ms: AtomicI64::new(i64::MIN),
        }
    }

    /// Prunes stale timestamps for `key`, then admits and records `now` if the key is
    /// under its limit.
    ///
    /// Returns `false` without recording anything when the limit is reached.
    pub fn check_and_record(&self, key: &str, now: DateTime<Utc>) -> bool {
        let admitted = {
            let mut timestamps = self
                .entries
                .entry(key.to_string())
                .or_insert_with(|| VecDeque::with_capacity(self.max_requests));

            self.prune(&mut *timestamps, now);

            if timestamps.len() >= self.max_requests {
                false
            } else {
                timestamps.push_back(now);
                true
            }
        };

        // The entry guard must be released first: retain() locks every shard.
        self.maybe_prune_idle(now);
        admitted
    }

    /// Whole seconds until `key` frees a slot, or 0 if it has one now.
    pub fn retry_after(&self, key: &str, now: DateTime<Utc>) -> u64 {
        let Some(timestamps) = self.entries.get(key) else {
            return 0;
        };

        let mut in_window = timestamps.iter().filter(|t| now - **t < self.window);
        let Some(oldest) = in_window.next().copied() else {
            return 0;
        };

        if 1 + in_window.count() < self.max_requests {
            return 0;
        }

        let remaining = (oldest + self.window - now).num_milliseconds().max(0);
        // Round up so clients never retry a moment too early.
        (remaining as u64).div_ceil(1000).max(1)
    }

    /// Drops keys with no timestamps left inside the window.
    ///
    /// Returns the number of keys removed.
    pub fn prune_idle(&self, now: DateTime<Utc>) -> usize {
        self.last_pruned_ms
            .store(now.timestamp_millis(), Ordering::Relaxed);

        let before = self.entries.len();
        self.entries.retain(|_, timestamps| {
            self.prune(timestamps, now);
            !timestamps.is_empty()
        });
        before.saturating_sub(self.entries.len())
    }

    /// Number of keys currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Runs [`RateLimiter::prune_idle`] if a full window has passed since the last run.
    ///
    /// Only the caller that wins the compare-exchange does the pass.
    fn maybe_prune_idle(&self, now: DateTime<Utc>) {
        let now_ms = now.timestamp_millis();
        let last = self.last_pruned_ms.load(Ordering::Relaxed);

        if last != i64::MIN && now_ms.saturating_sub(last) < self.window.num_milliseconds() {
            return;
        }

        if self
            .last_pruned_ms
            .compare_exchange(last, now_ms, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            let removed = self.prune_idle(now);
            if removed > 0 {
                tracing::debug!(removed, "Released idle rate limit keys");
            }
        }
    }

    fn prune(&self, timestamps: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>) {
        while let Some(oldest) = timestamps.front() {
            if now - *oldest >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_REQUESTS,
            Duration::seconds(DEFAULT_WINDOW_SECONDS),
        )
    }
}
