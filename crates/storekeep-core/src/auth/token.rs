use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::error::{AuthError, CoreError, CoreResult};

/// Signed claims carried by an access token. Times are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
}

/// Identity attached to a request after its token has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

/// Signs claims for `user_id`/`username`, valid from `now` for `ttl`.
pub fn create_token(
    secret: &str,
    ttl: Duration,
    user_id: i64,
    username: &str,
    now: u64,
) -> CoreResult<IssuedToken> {
    let expires_at = now.saturating_add(ttl.as_secs());
    let claims = Claims {
        user_id,
        username: username.to_string(),
        iat: now,
        exp: expires_at,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| CoreError::Signing(e.to_string()))?;

    Ok(IssuedToken { token, expires_at })
}

/// Checks `token` against `secret` at Unix time `now`.
///
/// The signature is checked before expiry, so a tampered token is always
/// reported as [`AuthError::InvalidSignature`]. A token is expired from its
/// `exp` second onwards, with no leeway.
pub fn verify_token(token: &str, secret: &str, now: u64) -> Result<VerifiedIdentity, AuthError> {
    let mut validation = Validation::default();
    // Expiry is judged below against the caller's clock.
    validation.validate_exp = false;

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::MalformedToken,
        })?
        .claims;

    if now >= claims.exp {
        return Err(AuthError::TokenExpired);
    }

    Ok(VerifiedIdentity {
        user_id: claims.user_id,
        username: claims.username,
    })
}

/// Issues and verifies tokens with one secret, lifetime and clock.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
    ttl: Duration,
    clock: SharedClock,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            secret: secret.into(),
            ttl,
            clock,
        }
    }

    pub fn issue(&self, user_id: i64, username: &str) -> CoreResult<IssuedToken> {
        create_token(&self.secret, self.ttl, user_id, username, self.clock.unix_seconds())
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        verify_token(token, &self.secret, self.clock.unix_seconds())
    }
}
