//! Time sources.
//!
//! The limiter measures refill with a monotonic [`Instant`]; tokens carry
//! wall-clock Unix seconds. [`Clock`] supplies both so that tests can drive
//! them together with a [`ManualClock`].

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Monotonic instant, used for token bucket refill.
    fn now(&self) -> Instant;

    /// Seconds since the Unix epoch, used for token `iat`/`exp`.
    fn unix_seconds(&self) -> u64;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same offset, so a test can hand one clone to the code
/// under test and advance time through another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    unix_origin: u64,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Starts at the current instant with the wall clock at `unix_origin`.
    pub fn at_unix(unix_origin: u64) -> Self {
        Self {
            origin: Instant::now(),
            unix_origin,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    pub fn advance_secs_f64(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at_unix(1_700_000_000)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }

    fn unix_seconds(&self) -> u64 {
        self.unix_origin + self.offset.lock().as_secs()
    }
}

/// Shared handle used wherever a clock is injected.
pub type SharedClock = Arc<dyn Clock>;
