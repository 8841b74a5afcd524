//! Single token bucket.

use std::time::{Duration, Instant};

/// Refill rate and capacity shared by every bucket in a registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterConfig {
    rate: f64,
    burst: u32,
}

impl LimiterConfig {
    /// `rps` tokens per second with a burst allowance equal to the rate.
    ///
    /// A zero rate is raised to one; use config validation to reject it
    /// before it gets here.
    pub fn per_second(rps: u32) -> Self {
        let rps = rps.max(1);
        Self {
            rate: f64::from(rps),
            burst: rps,
        }
    }

    /// Overrides the bucket capacity.
    pub fn with_burst(self, burst: u32) -> Self {
        Self {
            burst: burst.max(1),
            ..self
        }
    }

    /// Tokens added per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Maximum tokens a bucket can hold.
    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Time for an empty bucket to become full again.
    pub fn refill_window(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.burst) / self.rate)
    }
}

/// Token state for one client key.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A bucket holding its full burst allowance.
    pub fn full(config: &LimiterConfig, now: Instant) -> Self {
        Self {
            tokens: f64::from(config.burst),
            last_refill: now,
        }
    }

    /// Refills for the time elapsed since the last call, then takes one
    /// token if available.
    pub fn try_acquire(&mut self, config: &LimiterConfig, now: Instant) -> bool {
        self.refill(config, now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, config: &LimiterConfig, now: Instant) {
        // Instants from a clock that went backwards count as no elapsed time.
        let elapsed = now.saturating_duration_since(self.last_refill);
        let capacity = f64::from(config.burst);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * config.rate).min(capacity);
        self.last_refill = self.last_refill.max(now);
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn last_refill(&self) -> Instant {
        self.last_refill
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn drain(bucket: &mut TokenBucket, config: &LimiterConfig, now: Instant) -> Vec<bool> {
        (0..=config.burst())
            .map(|_| bucket.try_acquire(config, now))
            .collect()
    }

    #[test]
    fn burst_equals_rate_by_default() {
        let config = LimiterConfig::per_second(10);
        assert_eq!(config.burst(), 10);
        assert_eq!(config.rate(), 10.0);
    }

    #[test]
    fn zero_rate_is_clamped() {
        let config = LimiterConfig::per_second(0);
        assert_eq!(config.burst(), 1);
        assert_eq!(config.refill_window(), Duration::from_secs(1));
    }

    #[test]
    fn new_bucket_allows_exactly_burst_calls() {
        let config = LimiterConfig::per_second(10);
        let now = Instant::now();
        let mut bucket = TokenBucket::full(&config, now);

        let results = drain(&mut bucket, &config, now);
        assert_eq!(results.iter().filter(|ok| **ok).count(), 10);
        assert_eq!(results.last(), Some(&false));
    }

    #[test]
    fn denial_does_not_consume() {
        let config = LimiterConfig::per_second(1);
        let now = Instant::now();
        let mut bucket = TokenBucket::full(&config, now);

        assert!(bucket.try_acquire(&config, now));
        assert!(!bucket.try_acquire(&config, now));
        assert!(!bucket.try_acquire(&config, now));
        assert_eq!(bucket.tokens(), 0.0);

        assert!(bucket.try_acquire(&config, now + Duration::from_secs(1)));
    }

    #[test]
    fn two_per_second_scenario() {
        let config = LimiterConfig::per_second(2);
        let t0 = Instant::now();
        let mut bucket = TokenBucket::full(&config, t0);

        assert!(bucket.try_acquire(&config, t0));
        assert!(bucket.try_acquire(&config, t0));
        assert!(!bucket.try_acquire(&config, t0));

        let t1 = t0 + Duration::from_secs(1);
        assert!(bucket.try_acquire(&config, t1));
        assert!(bucket.try_acquire(&config, t1));
        assert!(!bucket.try_acquire(&config, t1));
    }

    #[test]
    fn partial_refill_accumulates() {
        let config = LimiterConfig::per_second(2);
        let t0 = Instant::now();
        let mut bucket = TokenBucket::full(&config, t0);
        drain(&mut bucket, &config, t0);

        // 0.25s at 2/s is half a token: not enough.
        let t1 = t0 + Duration::from_millis(250);
        assert!(!bucket.try_acquire(&config, t1));
        // Another 0.25s completes the token.
        let t2 = t1 + Duration::from_millis(250);
        assert!(bucket.try_acquire(&config, t2));
    }

    #[test]
    fn long_idle_refills_only_to_capacity() {
        let config = LimiterConfig::per_second(3);
        let t0 = Instant::now();
        let mut bucket = TokenBucket::full(&config, t0);

        let later = t0 + Duration::from_secs(3_600);
        let results = drain(&mut bucket, &config, later);
        assert_eq!(results, vec![true, true, true, false]);
    }

    #[test]
    fn explicit_burst_overrides_rate() {
        let config = LimiterConfig::per_second(1).with_burst(5);
        let now = Instant::now();
        let mut bucket = TokenBucket::full(&config, now);
        assert_eq!(drain(&mut bucket, &config, now).iter().filter(|ok| **ok).count(), 5);
        assert_eq!(config.refill_window(), Duration::from_secs(5));
    }

    #[test]
    fn clock_going_backwards_adds_nothing() {
        let config = LimiterConfig::per_second(1);
        let t0 = Instant::now() + Duration::from_secs(10);
        let mut bucket = TokenBucket::full(&config, t0);
        assert!(bucket.try_acquire(&config, t0));
        assert!(!bucket.try_acquire(&config, t0 - Duration::from_secs(5)));
        assert_eq!(bucket.last_refill(), t0);
        assert!(!bucket.try_acquire(&config, t0 + Duration::from_millis(500)));
    }

    proptest! {
        #[test]
        fn tokens_never_exceed_capacity(
            rps in 1u32..50,
            steps in prop::collection::vec((0u64..5_000, 0usize..4), 1..40),
        ) {
            let config = LimiterConfig::per_second(rps);
            let mut now = Instant::now();
            let mut bucket = TokenBucket::full(&config, now);

            for (idle_ms, calls) in steps {
                now += Duration::from_millis(idle_ms);
                for _ in 0..calls {
                    bucket.try_acquire(&config, now);
                }
                bucket.refill(&config, now);
                prop_assert!(bucket.tokens() <= f64::from(config.burst()));
                prop_assert!(bucket.tokens() >= 0.0);
            }
        }
    }
}
