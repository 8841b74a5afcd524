//! In-memory record stores.
//!
//! Both stores are safe to share behind an `Arc`; each guards its table with
//! a single `RwLock`.

pub mod products;
pub mod users;

pub use products::ProductStore;
pub use users::UserStore;
