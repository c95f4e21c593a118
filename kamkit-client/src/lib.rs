//! JSON-RPC client for the Kamailio control API over HTTP
//!
//! This crate sends control commands to a telephony server's JSON-RPC
//! endpoint and reshapes the verbose responses into compact documents for
//! admin front-ends.
//!
//! # Core Features
//!
//! - **Control calls**: dispatcher, hash-table, user-location and core
//!   commands on [`KamailioClient`]
//! - **Extractors**: pure functions in [`extract`] that validate a response
//!   and project the interesting fields
//! - **Peer checks**: certificate-skipping GET with a hard deadline
//! - **Observability**: injectable [`kamkit_core::RpcObserver`] and
//!   OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kamkit_client::KamailioClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KamailioClient::new("http://127.0.0.1:5060/RPC")?;
//!
//!     client.htable_set_int("ipban", "203.0.113.7", 1).await?;
//!     let entry = client.htable_get("ipban", "203.0.113.7").await?;
//!     println!("ban entry: {}", entry);
//!
//!     let nodes = client.dispatcher_list_simple().await?;
//!     println!("{}", kamkit_core::codec::to_pretty_text(&nodes)?);
//!     Ok(())
//! }
//! ```
//!
//! # From the Environment
//!
//! ```rust,no_run
//! use kamkit_client::{ClientBuilder, ClientConfig};
//!
//! # fn example() -> kamkit_core::Result<()> {
//! let client = ClientBuilder::from_config(ClientConfig::from_env()?).build()?;
//! # Ok(())
//! # }
//! ```

mod client;
mod client_builder;
mod config;
pub mod extract;
mod metrics;
mod transport;

pub use client::KamailioClient;
pub use client_builder::ClientBuilder;
pub use config::{ClientConfig, DEFAULT_PEER_TIMEOUT};
pub use metrics::{ClientMetrics, MetricsObserver};
pub use transport::HttpTransport;
