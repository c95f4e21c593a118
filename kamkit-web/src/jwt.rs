//! Signed session tokens
//!
//! Tokens are HS256 JWTs carrying a `username` and an `exp` claim. The
//! expiry is checked with zero leeway: a token is rejected the second its
//! `exp` passes.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use kamkit_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Claims carried by every kamkit token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Expiry as Unix seconds
    pub exp: i64,
}

/// Sign a token for `username` that expires at `expires_at`
pub fn issue_token_until(username: &str, key: &str, expires_at: DateTime<Utc>) -> Result<String> {
    let claims = Claims {
        username: username.to_string(),
        exp: expires_at.timestamp(),
    };

    tracing::debug!(username = %username, exp = %expires_at, "Issuing token");
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )
    .map_err(|e| Error::TokenIssue(e.to_string()))
}

/// Sign a token valid for `lifetime` from now
///
/// Returns the token and its expiry instant.
pub fn issue_token(
    username: &str,
    key: &str,
    lifetime: Duration,
) -> Result<(String, DateTime<Utc>)> {
    let expires_at = Utc::now()
        .checked_add_signed(lifetime)
        .ok_or_else(|| Error::TokenIssue("expiry out of range".to_string()))?;
    let token = issue_token_until(username, key, expires_at)?;
    Ok((token, expires_at))
}

/// Sign a long-lived API token valid for `days` calendar days
pub fn issue_api_token(username: &str, key: &str, days: i64) -> Result<(String, DateTime<Utc>)> {
    let lifetime = Duration::try_days(days)
        .ok_or_else(|| Error::TokenIssue(format!("invalid token lifetime: {} days", days)))?;
    issue_token(username, key, lifetime)
}

/// Verify `token` with `key` and return the username it was issued to
///
/// ```rust
/// use chrono::Duration;
/// use kamkit_core::Error;
/// use kamkit_web::jwt;
///
/// let (token, _) = jwt::issue_token("admin", "s3cret", Duration::minutes(5)).unwrap();
/// assert_eq!(jwt::validate(&token, "s3cret").unwrap(), "admin");
/// assert_eq!(jwt::validate(&token, "other"), Err(Error::InvalidSignature));
/// ```
pub fn validate(token: &str, key: &str) -> Result<String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
        .map_err(|err| {
            tracing::debug!(error = %err, "Token rejected");
            match err.kind() {
                ErrorKind::InvalidSignature => Error::InvalidSignature,
                ErrorKind::ExpiredSignature => Error::Expired,
                _ => Error::MalformedToken(err.to_string()),
            }
        })?;

    Ok(data.claims.username)
}
