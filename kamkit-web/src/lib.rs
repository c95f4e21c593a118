//! Helpers for HTTP admin endpoints in front of a Kamailio server
//!
//! Framework-agnostic: everything works on `http::HeaderMap` and raw body
//! bytes, so it fits whichever server the application runs.
//!
//! - [`jwt`]: issue and validate HS256 session tokens
//! - [`auth`]: find a token in the `Authorization` header, a cookie or the
//!   body, then validate it
//! - [`body`]: parse JSON or URL-encoded bodies and check required fields
//! - [`ids`]: UUID and nanoid-style identifiers
//!
//! # Example
//!
//! ```rust
//! use chrono::Duration;
//! use http::HeaderMap;
//! use kamkit_web::{auth, body, jwt};
//!
//! let (token, _) = jwt::issue_token("admin", "key", Duration::minutes(10)).unwrap();
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("authorization", format!("Bearer {}", token).parse().unwrap());
//!
//! let body = b"table=ipban&key=203.0.113.7";
//! let fields = body::parse_body_fields(body, &["table", "key"]).unwrap();
//! let user = auth::authenticate(&headers, &fields, "key").unwrap();
//! assert_eq!(user, "admin");
//! ```

pub mod auth;
pub mod body;
pub mod ids;
pub mod jwt;

pub use auth::{authenticate, check_bearer_token, check_gui_access, extract_bearer, extract_cookie};
pub use jwt::Claims;
