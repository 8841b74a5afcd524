use crate::error::AuthError;

/// Extracts the token from an `Authorization: Bearer <token>` value.
///
/// The value must split on single spaces into exactly two parts, the first
/// being `Bearer`. Anything else, including a missing header, is
/// [`AuthError::MalformedAuthorizationHeader`].
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MalformedAuthorizationHeader)?;

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedAuthorizationHeader),
    }
}
