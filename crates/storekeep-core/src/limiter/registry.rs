//! Per-key limiter registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use super::bucket::{LimiterConfig, TokenBucket};
use crate::clock::SharedClock;

/// One token bucket per client key, created on first sight.
///
/// Lookups for known keys take a shared lock on a single map shard; a miss
/// falls through to `entry`, which holds the shard's write lock while it
/// re-checks and inserts, so a key's bucket is created exactly once even
/// when several requests race on it. Each bucket sits behind its own mutex,
/// which serializes refill-then-consume for that key only.
pub struct LimiterRegistry {
    buckets: DashMap<String, Mutex<TokenBucket>>,
    config: LimiterConfig,
    clock: SharedClock,
    allowed: AtomicU64,
    denied: AtomicU64,
}

/// Counters exposed on the metrics endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimiterStats {
    pub allowed: u64,
    pub denied: u64,
    pub tracked_keys: usize,
}

impl std::fmt::Debug for LimiterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimiterRegistry")
            .field("config", &self.config)
            .field("tracked_keys", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl LimiterRegistry {
    pub fn new(config: LimiterConfig, clock: SharedClock) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
            clock,
            allowed: AtomicU64::new(0),
            denied: AtomicU64::new(0),
        }
    }

    /// Takes one token from `key`'s bucket, creating a full bucket if the key
    /// is new. Returns `false` without consuming anything when empty.
    pub fn allow(&self, key: &str) -> bool {
        let now = self.clock.now();

        let allowed = if let Some(bucket) = self.buckets.get(key) {
            bucket.lock().try_acquire(&self.config, now)
        } else {
            let bucket = self
                .buckets
                .entry(key.to_owned())
                .or_insert_with(|| {
                    tracing::trace!(key, "creating limiter entry");
                    Mutex::new(TokenBucket::full(&self.config, now))
                });
            let allowed = bucket.lock().try_acquire(&self.config, now);
            allowed
        };

        if allowed {
            self.allowed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied.fetch_add(1, Ordering::Relaxed);
        }
        allowed
    }

    /// Current token count for `key`, without refilling.
    #[cfg(test)]
    pub(crate) fn tokens(&self, key: &str) -> Option<f64> {
        self.buckets.get(key).map(|bucket| bucket.lock().tokens())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drops entries untouched for longer than `max_idle`.
    ///
    /// The threshold is raised to the bucket refill window: an entry idle
    /// that long is full, so recreating it later yields the same decisions.
    /// Returns the number of entries removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let threshold = max_idle.max(self.config.refill_window());
        let now = self.clock.now();
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| {
            now.saturating_duration_since(bucket.get_mut().last_refill()) <= threshold
        });
        before.saturating_sub(self.buckets.len())
    }

    pub fn stats(&self) -> LimiterStats {
        LimiterStats {
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            tracked_keys: self.buckets.len(),
        }
    }
}
