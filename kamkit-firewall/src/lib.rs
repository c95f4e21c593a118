//! Local IP ban list on top of the host packet filter
//!
//! Banned sources are rejected (or dropped) by rules in a dedicated chain of
//! the `filter` table, `APIBANLOCAL` unless configured otherwise.
//!
//! # Example
//!
//! ```rust,no_run
//! use kamkit_firewall::{Firewall, Protocol};
//!
//! # async fn example() -> kamkit_core::Result<()> {
//! let firewall = Firewall::system();
//!
//! firewall.apply(Protocol::Ipv4, "add", "203.0.113.7").await?;
//! firewall.unban("203.0.113.7").await?;
//! firewall.apply(Protocol::Ipv6, "flush", "").await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod firewall;
mod rule;

pub use backend::{FirewallBackend, IptablesCommand};
pub use config::{FirewallConfig, DEFAULT_CHAIN};
pub use firewall::Firewall;
pub use rule::{ban_rule, is_ip_address, Action, ActionOutcome, BanTarget, ChainStatus, Protocol};
