//! Per-client request throttling.
//!
//! - [`bucket`] — the token bucket and its [`LimiterConfig`].
//! - [`registry`] — [`LimiterRegistry`], one bucket per client key.

pub mod bucket;
pub mod registry;

pub use bucket::{LimiterConfig, TokenBucket};
pub use registry::{LimiterRegistry, LimiterStats};
