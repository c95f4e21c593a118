//! Core JSON-RPC types, codec and errors for kamkit
//!
//! This crate holds the transport-agnostic half of the Kamailio control-API
//! pipeline:
//!
//! - **Types**: the outgoing [`RpcRequest`] and its [`Id`]
//! - **Codec**: request building and the response validator every call goes
//!   through
//! - **Error handling**: the [`Error`] taxonomy shared by all kamkit crates
//! - **Observability**: subscriber setup and the [`RpcObserver`] hook
//!
//! # Pipeline
//!
//! ```text
//! build_request -> transport (kamkit-client) -> validate_response -> extractor
//! ```
//!
//! # Example
//!
//! ```rust
//! use kamkit_core::{codec, RpcRequest};
//!
//! let request = RpcRequest::call("htable.dump").param("htable", "ipban").build();
//! let json = codec::encode_request(&request).unwrap();
//!
//! let decoded = codec::decode_request(&json).unwrap();
//! assert_eq!(decoded.method, "htable.dump");
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use error::{Error, Result, RpcErrorData};
pub use observability::{
    init_observability, shutdown_observability, NoopObserver, ObservabilityConfig, RpcObserver,
    TracingObserver,
};
pub use types::{Id, RequestBuilder, RpcRequest};
