use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};

const USERNAME_CHARS: std::ops::RangeInclusive<usize> = 3..=50;
const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Checks registration input before any hashing is done.
pub fn validate_registration(username: &str, password: &str) -> CoreResult<()> {
    if !USERNAME_CHARS.contains(&username.chars().count()) {
        return Err(CoreError::Validation(format!(
            "username must be between {} and {} characters",
            USERNAME_CHARS.start(),
            USERNAME_CHARS.end()
        )));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(CoreError::Validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}
