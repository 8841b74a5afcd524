//! Access tokens and the `Authorization` header.

pub mod header;
pub mod token;

pub use header::bearer_token;
pub use token::{create_token, verify_token, Claims, IssuedToken, TokenSigner, VerifiedIdentity};
