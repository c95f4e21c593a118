//! Pulling tokens out of requests
//!
//! Two sources are supported: an `Authorization: <scheme> <token>` header
//! and a named cookie. Both hand the token to [`crate::jwt::validate`].

use crate::jwt;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use kamkit_core::{Error, Result};
use std::collections::HashMap;

/// Shortest text accepted as a bearer token
pub const MIN_TOKEN_LEN: usize = 10;

/// Body field that carries a token in place of the header
pub const TOKEN_FIELD: &str = "token";

/// Token from the `Authorization` header
///
/// The header must contain a space; the second space-separated piece is the
/// token and must be at least [`MIN_TOKEN_LEN`] characters.
///
/// ```rust
/// use http::HeaderMap;
/// use kamkit_web::auth::extract_bearer;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("authorization", "Bearer abcdefghijk".parse().unwrap());
/// assert_eq!(extract_bearer(&headers).unwrap(), "abcdefghijk");
/// ```
pub fn extract_bearer(headers: &HeaderMap) -> Result<String> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = value.split(' ').nth(1).ok_or(Error::MissingHeader)?;
    if token.chars().count() < MIN_TOKEN_LEN {
        return Err(Error::TokenTooShort);
    }
    Ok(token.to_string())
}

/// Value of cookie `name`, searched across every `Cookie` header
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Result<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .ok_or(Error::NoCookie)
}

/// Authenticate a request and return the username
///
/// A `token` field in the parsed body takes priority over the bearer header.
pub fn authenticate(
    headers: &HeaderMap,
    body_fields: &HashMap<String, String>,
    key: &str,
) -> Result<String> {
    let token = match body_fields.get(TOKEN_FIELD) {
        Some(token) => token.clone(),
        None => extract_bearer(headers)?,
    };
    jwt::validate(&token, key)
}

/// Validate the bearer token and return the username
pub fn check_bearer_token(headers: &HeaderMap, key: &str) -> Result<String> {
    let token = extract_bearer(headers)?;
    jwt::validate(&token, key)
}

/// Validate the session cookie of a browser request and return the username
pub fn check_gui_access(headers: &HeaderMap, cookie_name: &str, key: &str) -> Result<String> {
    let token = extract_cookie(headers, cookie_name)?;
    jwt::validate(&token, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use http::HeaderValue;

    const KEY: &str = "kamkit-test-key";

    fn with_header(name: http::header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn token_for(user: &str) -> String {
        jwt::issue_token(user, KEY, Duration::minutes(5)).unwrap().0
    }

    #[test]
    fn test_bearer_extraction() {
        let headers = with_header(AUTHORIZATION, "Bearer abcdefghijk");
        assert_eq!(extract_bearer(&headers).unwrap(), "abcdefghijk");
    }

    #[test]
    fn test_bearer_too_short() {
        let headers = with_header(AUTHORIZATION, "Bearer short");
        assert_eq!(extract_bearer(&headers), Err(Error::TokenTooShort));

        let headers = with_header(AUTHORIZATION, "Bearer  abcdefghijk");
        assert_eq!(extract_bearer(&headers), Err(Error::TokenTooShort));
    }

    #[test]
    fn test_bearer_missing_header() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Err(Error::MissingHeader));

        let headers = with_header(AUTHORIZATION, "abcdefghijklmnop");
        assert_eq!(extract_bearer(&headers), Err(Error::MissingHeader));
    }

    #[test]
    fn test_cookie_extraction() {
        let headers = with_header(COOKIE, "theme=dark; session=abc123; lang=en");
        assert_eq!(extract_cookie(&headers, "session").unwrap(), "abc123");
        assert_eq!(extract_cookie(&headers, "missing"), Err(Error::NoCookie));
        assert_eq!(extract_cookie(&HeaderMap::new(), "session"), Err(Error::NoCookie));
    }

    #[test]
    fn test_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("session=\"quoted\""));
        assert_eq!(extract_cookie(&headers, "session").unwrap(), "quoted");
    }

    #[test]
    fn test_authenticate_prefers_body_token() {
        let headers = with_header(AUTHORIZATION, &format!("Bearer {}", token_for("header-user")));
        let mut fields = HashMap::new();
        fields.insert("token".to_string(), token_for("body-user"));

        assert_eq!(authenticate(&headers, &fields, KEY).unwrap(), "body-user");
        assert_eq!(authenticate(&headers, &HashMap::new(), KEY).unwrap(), "header-user");
    }

    #[test]
    fn test_authenticate_bad_body_token_does_not_fall_back() {
        let headers = with_header(AUTHORIZATION, &format!("Bearer {}", token_for("header-user")));
        let mut fields = HashMap::new();
        fields.insert("token".to_string(), "garbage".to_string());

        assert!(matches!(authenticate(&headers, &fields, KEY), Err(Error::MalformedToken(_))));
    }

    #[test]
    fn test_check_bearer_token() {
        let headers = with_header(AUTHORIZATION, &format!("Bearer {}", token_for("alice")));
        assert_eq!(check_bearer_token(&headers, KEY).unwrap(), "alice");
        assert_eq!(check_bearer_token(&headers, "wrong"), Err(Error::InvalidSignature));
    }

    #[test]
    fn test_check_gui_access() {
        let headers = with_header(COOKIE, &format!("kamsession={}", token_for("admin")));
        assert_eq!(check_gui_access(&headers, "kamsession", KEY).unwrap(), "admin");
        assert_eq!(check_gui_access(&headers, "other", KEY), Err(Error::NoCookie));
    }
}
