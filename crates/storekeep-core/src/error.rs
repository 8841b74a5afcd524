//! Error types for `storekeep-core`.
//!
//! Domain operations return [`CoreResult<T>`]. Credential checks return
//! [`AuthError`], whose `Display` text is the message shown to clients.

/// Unified error type for store and token-issuing operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed a field constraint (length, range, ...).
    #[error("{0}")]
    Validation(String),

    /// The requested record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness constraint would be violated.
    #[error("{0}")]
    Conflict(String),

    /// A token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Convenience alias used throughout `storekeep-core`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Reasons a request fails the authentication gate.
///
/// Every variant is terminal for the request. `InvalidSignature` and
/// `MalformedToken` share a client message; `TokenExpired` is kept distinct
/// so clients know to re-authenticate rather than treat the token as forged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Missing `Authorization` header, wrong scheme, or wrong number of parts.
    #[error("Invalid authorization header format")]
    MalformedAuthorizationHeader,

    /// The token is not a well-formed signed assertion.
    #[error("Invalid token")]
    MalformedToken,

    /// The signature does not match the shared secret.
    #[error("Invalid token")]
    InvalidSignature,

    /// The signature is valid but the expiry instant has passed.
    #[error("Token expired")]
    TokenExpired,
}
