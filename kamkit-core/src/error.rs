//! Error types for kamkit
//!
//! Every helper in the workspace reports failures through the single
//! [`Error`] enum defined here. Errors are returned to the immediate caller;
//! nothing in kamkit retries or recovers locally. The surrounding application
//! decides whether to log, map to an HTTP status, or abort.
//!
//! # Error Categories
//!
//! - **Transport**: `Transport`, `Timeout`
//! - **Response**: `InvalidResponse`, `Remote`, `Format`, `Serialization`
//! - **Authentication**: `MissingHeader`, `TokenTooShort`, `NoCookie`,
//!   `InvalidSignature`, `Expired`, `MalformedToken`, `TokenIssue`
//! - **Firewall**: `MissingBaseChain`, `UnknownAction`, `InvalidAddress`,
//!   `Firewall`
//! - **Input**: `InvalidBody`, `MissingFields`
//! - **Storage and setup**: `Sql`, `Config`
//!
//! # Remote Errors
//!
//! The control API reports failures inside an otherwise successful HTTP
//! response using the JSON-RPC error envelope. [`RpcErrorData`] is the wire
//! shape of that envelope; the validator lifts its message into
//! [`Error::Remote`].
//!
//! # Examples
//!
//! ```rust
//! use kamkit_core::Error;
//!
//! let error = Error::remote("busy", Some(500));
//! assert_eq!(error.to_string(), "Remote error: busy");
//! assert!(!error.is_timeout());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for kamkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type shared by all kamkit crates
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Connection could not be established, the request could not be sent,
    /// or the response body could not be read.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The peer did not answer within the configured deadline.
    ///
    /// Kept apart from `Transport` so callers can treat an unreachable peer
    /// differently from a malformed call.
    #[error("Request timed out")]
    Timeout,

    /// The response body is not syntactically valid JSON.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The server answered with a JSON-RPC error envelope.
    #[error("Remote error: {message}")]
    Remote {
        /// Message taken from `error.message`
        message: String,
        /// Code taken from `error.code`, when the server sent one
        code: Option<i64>,
    },

    /// A timestamp or number in the response could not be parsed.
    #[error("Format error: {0}")]
    Format(String),

    /// Encoding a value to JSON text failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The Authorization header has no `<scheme> <token>` pair.
    #[error("no valid header found")]
    MissingHeader,

    /// The bearer token is shorter than the plausibility floor.
    #[error("no token found")]
    TokenTooShort,

    /// The named cookie is not present on the request.
    #[error("no cookie found")]
    NoCookie,

    /// The token signature does not verify with the given key.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// The token expiry has passed.
    #[error("token has expired")]
    Expired,

    /// The token could not be decoded or failed a non-signature check.
    #[error("token is not valid: {0}")]
    MalformedToken(String),

    /// Signing a new token failed.
    #[error("token could not be issued: {0}")]
    TokenIssue(String),

    /// A base chain the ban chain hooks into is missing.
    #[error("iptables does not contain expected {0} chain")]
    MissingBaseChain(String),

    /// The firewall action is not one of `add`, `delete`, `flush`.
    #[error("unknown task: {0}")]
    UnknownAction(String),

    /// The text is not an IPv4 or IPv6 address.
    #[error("not an IP address: {0}")]
    InvalidAddress(String),

    /// The firewall tool failed.
    #[error("Firewall error: {0}")]
    Firewall(String),

    /// A request body is neither JSON nor URL-encoded pairs.
    #[error("unable to parse body: {0}")]
    InvalidBody(String),

    /// Required fields are missing or empty.
    ///
    /// The message lists every offending key as `"<key> is missing. "`.
    #[error("{0}")]
    MissingFields(String),

    /// Running a query or reading a row failed.
    #[error("SQL error: {0}")]
    Sql(String),

    /// Configuration could not be read or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a [`Error::Remote`] from an error envelope's parts
    pub fn remote(message: impl Into<String>, code: Option<i64>) -> Self {
        Error::Remote {
            message: message.into(),
            code,
        }
    }

    /// True when the failure was a missed deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    /// True for every failure raised while authenticating a request
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Error::MissingHeader
                | Error::TokenTooShort
                | Error::NoCookie
                | Error::InvalidSignature
                | Error::Expired
                | Error::MalformedToken(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// JSON-RPC 2.0 error envelope as sent by the control API
///
/// Kamailio fills `code` and `message`; `data` is optional and rarely used.
///
/// ```rust
/// use kamkit_core::RpcErrorData;
///
/// let data: RpcErrorData =
///     serde_json::from_str(r#"{"code":500,"message":"busy"}"#).unwrap();
/// assert_eq!(data.to_string(), "[500] busy");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorData {
    /// Numeric error code, absent on some older server builds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    /// Human-readable error message
    #[serde(default)]
    pub message: String,

    /// Optional additional error information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl std::fmt::Display for RpcErrorData {
    /// Formats as "[code] message", or just the message without a code
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<RpcErrorData> for Error {
    fn from(data: RpcErrorData) -> Self {
        Error::remote(data.message, data.code)
    }
}
