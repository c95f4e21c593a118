//! Client configuration
//!
//! [`ClientConfig`] carries the control-API endpoint and the two deadlines
//! the transport applies. It can be built in code or read from the
//! environment:
//!
//! - `KAMKIT_RPC_URL` (required): JSON-RPC endpoint, e.g.
//!   `http://127.0.0.1:5060/RPC`
//! - `KAMKIT_RPC_TIMEOUT_SECS` (optional): deadline for regular calls; unset
//!   means no deadline beyond the HTTP client's own
//! - `KAMKIT_PEER_TIMEOUT_SECS` (default: 2): deadline for peer health checks

use kamkit_core::{Error, Result};
use std::time::Duration;

/// Default deadline for insecure peer checks
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(2);

/// Endpoint and deadlines for a [`crate::KamailioClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// JSON-RPC endpoint of the telephony server
    pub url: String,
    /// Deadline for regular control calls
    pub timeout: Option<Duration>,
    /// Deadline for certificate-skipping peer checks
    pub peer_timeout: Duration,
}

impl ClientConfig {
    /// Configuration for `url` with no call deadline and the default peer deadline
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: None,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
        }
    }

    /// Set the deadline for regular calls
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the deadline for peer checks
    pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
        self.peer_timeout = timeout;
        self
    }

    /// Read the configuration from `KAMKIT_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("KAMKIT_RPC_URL")
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Config("KAMKIT_RPC_URL is not set".to_string()))?;

        let mut config = Self::new(url);

        if let Some(raw) = lookup("KAMKIT_RPC_TIMEOUT_SECS") {
            config.timeout = Some(parse_secs("KAMKIT_RPC_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("KAMKIT_PEER_TIMEOUT_SECS") {
            config.peer_timeout = parse_secs("KAMKIT_PEER_TIMEOUT_SECS", &raw)?;
        }

        Ok(config)
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        Error::Config(format!("{} must be a whole number of seconds, got {:?}", key, raw))
    })?;
    if secs == 0 {
        return Err(Error::Config(format!("{} must be greater than zero", key)));
    }
    Ok(Duration::from_secs(secs))
}
