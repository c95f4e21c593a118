//! kamkit - control-plane helpers for Kamailio admin applications
//!
//! This is the main convenience crate that re-exports all kamkit sub-crates.
//! Use it when an application wants a single dependency for the whole
//! toolkit.
//!
//! # Architecture
//!
//! kamkit is organized into modular crates:
//!
//! - **kamkit-core**: request types, codec, response validation, errors,
//!   observability
//! - **kamkit-client**: HTTP JSON-RPC client and response extractors
//! - **kamkit-web**: tokens, header and cookie extraction, body parsing, ids
//! - **kamkit-firewall**: ban chain on top of `iptables`
//! - **kamkit-sql**: SQL result sets as JSON
//!
//! # Quick Start - Control API
//!
//! ```rust,no_run
//! use kamkit::KamailioClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KamailioClient::new("http://127.0.0.1:5060/RPC")?;
//!
//!     let groups = client.dispatcher_list_by_group().await?;
//!     println!("{}", kamkit::core::codec::to_pretty_text(&groups)?);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Admin Endpoint
//!
//! ```rust
//! use chrono::Duration;
//! use http::HeaderMap;
//! use kamkit::web::{auth, body, jwt};
//!
//! let (token, _) = jwt::issue_token("admin", "key", Duration::hours(1)).unwrap();
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("cookie", format!("kamsession={}", token).parse().unwrap());
//!
//! let user = auth::check_gui_access(&headers, "kamsession", "key").unwrap();
//! let fields = body::parse_body(br#"{"address":"203.0.113.7"}"#);
//! assert_eq!(user, "admin");
//! assert_eq!(fields["address"], "203.0.113.7");
//! ```

// Re-export all public APIs from sub-crates
pub use kamkit_client as client;
pub use kamkit_core as core;
pub use kamkit_firewall as firewall;
pub use kamkit_sql as sql;
pub use kamkit_web as web;

// Convenience re-exports of the most commonly used types
pub use kamkit_client::{ClientBuilder, KamailioClient};
pub use kamkit_core::{Error, Result};
pub use kamkit_firewall::Firewall;
