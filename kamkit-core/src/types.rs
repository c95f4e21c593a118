//! JSON-RPC 2.0 request types for the Kamailio control API
//!
//! The control API speaks plain JSON-RPC 2.0 over HTTP. kamkit only ever
//! acts as a client, so this module models the outgoing request and its
//! correlation id. Responses are handled as raw `serde_json::Value` trees by
//! the validator in [`crate::codec`].
//!
//! # Request IDs
//!
//! Ids are derived from the wall clock at microsecond resolution and sent as
//! decimal strings. Uniqueness is best effort: two calls inside the same
//! microsecond share an id. This has no observable effect because every call
//! is paired with its response by the HTTP exchange itself, never by id.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// JSON-RPC 2.0 request ID
///
/// JSON-RPC 2.0 allows string, number or null ids. kamkit generates string ids
/// (see [`Id::from_clock`]) but accepts any form when decoding.
///
/// ```rust
/// use kamkit_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier, the form kamkit sends
    String(String),
    /// Numeric identifier
    Number(i64),
    /// Null identifier
    Null,
}

impl Id {
    /// Id made from the current time in microseconds since the Unix epoch
    pub fn from_clock() -> Self {
        Id::String(chrono::Utc::now().timestamp_micros().to_string())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

/// JSON-RPC 2.0 request message
///
/// Immutable once built; one instance per call, discarded after sending.
/// `params` is an ordered name → value mapping and is omitted from the wire
/// form when the method takes no parameters.
///
/// # Examples
///
/// ```rust
/// use kamkit_core::RpcRequest;
///
/// let req = RpcRequest::call("htable.get")
///     .param("htable", "ipban")
///     .param("key", "10.0.0.1")
///     .build();
///
/// assert_eq!(req.jsonrpc, "2.0");
/// assert_eq!(req.method, "htable.get");
/// assert_eq!(req.params.unwrap()["htable"], "ipban");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// Name of the remote method to invoke
    pub method: String,
    /// Named parameters in insertion order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Correlation id
    pub id: Id,
}

impl RpcRequest {
    /// Create a request with explicit params and id
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Id) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    /// Start building a request for `method` with a clock-derived id
    pub fn call(method: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            method: method.into(),
            params: Map::new(),
        }
    }
}

/// Fluent builder returned by [`RpcRequest::call`]
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: String,
    params: Map<String, Value>,
}

impl RequestBuilder {
    /// Add a named parameter; a repeated name replaces the earlier value
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Finish the request, stamping it with [`Id::from_clock`]
    pub fn build(self) -> RpcRequest {
        let params = if self.params.is_empty() {
            None
        } else {
            Some(Value::Object(self.params))
        };
        RpcRequest::new(self.method, params, Id::from_clock())
    }
}
