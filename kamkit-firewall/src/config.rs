//! Ban-chain configuration
//!
//! - `KAMKIT_BAN_CHAIN` (default: `APIBANLOCAL`): chain holding ban rules
//! - `KAMKIT_BAN_TARGET` (default: `REJECT`): `REJECT` or `DROP`

use crate::rule::BanTarget;
use kamkit_core::{Error, Result};

/// Default name of the ban chain
pub const DEFAULT_CHAIN: &str = "APIBANLOCAL";

#[derive(Debug, Clone, PartialEq)]
pub struct FirewallConfig {
    /// Chain that holds the ban rules
    pub chain: String,
    /// Jump target of each ban rule
    pub target: BanTarget,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            chain: DEFAULT_CHAIN.to_string(),
            target: BanTarget::default(),
        }
    }
}

impl FirewallConfig {
    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = chain.into();
        self
    }

    pub fn with_target(mut self, target: BanTarget) -> Self {
        self.target = target;
        self
    }

    /// Read the configuration from `KAMKIT_BAN_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(chain) = lookup("KAMKIT_BAN_CHAIN") {
            let chain = chain.trim();
            if chain.is_empty() || chain.contains(char::is_whitespace) {
                return Err(Error::Config(format!("invalid ban chain name {:?}", chain)));
            }
            config.chain = chain.to_string();
        }
        if let Some(target) = lookup("KAMKIT_BAN_TARGET") {
            config.target = target.trim().parse()?;
        }

        Ok(config)
    }
}
