//! storekeep core library — admission control and domain logic.
//!
//! `storekeep-core` holds everything the HTTP layer decides admission and
//! serves requests with, free of any web framework:
//!
//! # Modules
//!
//! - [`clock`] — [`Clock`] trait with [`SystemClock`] and the test-driven [`ManualClock`].
//! - [`limiter`] — token buckets and the per-client [`LimiterRegistry`].
//! - [`auth`] — access token issue/verify and `Authorization` header parsing.
//! - [`model`] — users, products, paging.
//! - [`store`] — in-memory [`UserStore`] and [`ProductStore`].
//! - [`error`] — [`CoreError`], [`CoreResult`] and the gate's [`AuthError`].

pub mod auth;
pub mod clock;
pub mod error;
pub mod limiter;
pub mod model;
pub mod store;

pub use auth::{bearer_token, IssuedToken, TokenSigner, VerifiedIdentity};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{AuthError, CoreError, CoreResult};
pub use limiter::{LimiterConfig, LimiterRegistry, LimiterStats};
pub use model::{NewProduct, PageRequest, Product, ProductPage, ProductUpdate, User};
pub use store::{ProductStore, UserStore};
