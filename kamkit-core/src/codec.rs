//! Encoding of requests and validation of responses
//!
//! This module is the two ends of every control-API call:
//!
//! - **Request side**: [`build_request`] turns a method name and named
//!   parameters into the serialized JSON-RPC document that goes on the wire.
//! - **Response side**: [`validate_response`] is the mandatory gate every
//!   response passes before anything reads from it.
//!
//! # Validation Order
//!
//! The order is fixed and applied everywhere:
//!
//! 1. The body must be syntactically valid JSON, else
//!    [`Error::InvalidResponse`].
//! 2. A non-empty `error.message` string means the server refused the call,
//!    reported as [`Error::Remote`].
//! 3. Otherwise the parsed document is handed back untouched.
//!
//! # Examples
//!
//! ```rust
//! use kamkit_core::{codec, Error};
//!
//! let ok = codec::validate_response(r#"{"jsonrpc":"2.0","result":{"uptime":42},"id":"1"}"#);
//! assert_eq!(ok.unwrap()["result"]["uptime"], 42);
//!
//! let refused = codec::validate_response(r#"{"error":{"message":"busy"}}"#);
//! assert!(matches!(refused, Err(Error::Remote { .. })));
//! ```

use crate::error::{Error, Result};
use crate::types::RpcRequest;
use serde::Serialize;
use serde_json::{Map, Value};

/// Encode any serializable value to compact JSON text
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a request to its wire form
pub fn encode_request(req: &RpcRequest) -> Result<String> {
    encode(req)
}

/// Decode a request from its wire form
pub fn decode_request(data: &str) -> Result<RpcRequest> {
    serde_json::from_str(data).map_err(|e| Error::Serialization(e.to_string()))
}

/// Build the serialized request for `method` with the given named params
///
/// The id comes from the clock. This stage has no failure mode of its own:
/// a request made of strings and `Value`s always serializes, so an encoding
/// failure degrades to an empty document rather than an error.
///
/// ```rust
/// use kamkit_core::codec;
/// use serde_json::{json, Map};
///
/// let mut params = Map::new();
/// params.insert("htable".into(), json!("ipban"));
///
/// let text = codec::build_request("htable.dump", params);
/// let parsed = codec::decode_request(&text).unwrap();
/// assert_eq!(parsed.method, "htable.dump");
/// assert_eq!(parsed.params.unwrap()["htable"], "ipban");
/// ```
pub fn build_request(method: &str, params: Map<String, Value>) -> String {
    let mut builder = RpcRequest::call(method);
    for (name, value) in params {
        builder = builder.param(name, value);
    }
    encode_request(&builder.build()).unwrap_or_default()
}

/// Validate a raw response body and return the parsed document
///
/// See the module docs for the order of checks. An `error` object whose
/// `message` is missing or empty does not count as a refusal.
pub fn validate_response(body: &str) -> Result<Value> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| Error::InvalidResponse(format!("invalid json received: {}", e)))?;

    if let Some(error) = document.get("error") {
        let message = error.get("message").and_then(Value::as_str).unwrap_or("");
        if !message.is_empty() {
            let code = error.get("code").and_then(Value::as_i64);
            return Err(Error::remote(message, code));
        }
    }

    Ok(document)
}

/// Render a value as JSON text indented with tabs
///
/// This is the presentation used by every text-producing helper so that
/// admin front-ends receive the same layout regardless of the source.
pub fn to_pretty_text(value: &Value) -> Result<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    String::from_utf8(out).map_err(|e| Error::Serialization(e.to_string()))
}
