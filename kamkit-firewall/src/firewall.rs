//! Ban-chain management
//!
//! Bans live in one dedicated chain of the `filter` table. The chain is
//! created on first use and linked from the top of `INPUT` and `FORWARD`, so
//! every inbound or routed packet passes through it before other rules.

use crate::backend::{FirewallBackend, IptablesCommand};
use crate::config::FirewallConfig;
use crate::rule::{ban_rule, Action, ActionOutcome, ChainStatus, Protocol};
use kamkit_core::{Error, Result};

const FILTER_TABLE: &str = "filter";
const BASE_CHAINS: [&str; 2] = ["INPUT", "FORWARD"];

/// Maintains the ban chain through a [`FirewallBackend`]
#[derive(Debug, Clone)]
pub struct Firewall<B = IptablesCommand> {
    backend: B,
    config: FirewallConfig,
}

impl Firewall<IptablesCommand> {
    /// Firewall driving the host's `iptables` with the default chain and target
    pub fn system() -> Self {
        Self::new(IptablesCommand::new(), FirewallConfig::default())
    }
}

impl<B: FirewallBackend> Firewall<B> {
    pub fn new(backend: B, config: FirewallConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &FirewallConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create the ban chain and hook it into `INPUT` and `FORWARD`
    ///
    /// Fails with [`Error::MissingBaseChain`] when either base chain is
    /// absent. An existing ban chain is left untouched, jumps included.
    pub async fn ensure_chain(&self, protocol: Protocol) -> Result<ChainStatus> {
        let chains = self
            .backend
            .list_chains(protocol, FILTER_TABLE)
            .await
            .map_err(|e| Error::Firewall(format!("failed to read iptables: {}", e)))?;

        for base in BASE_CHAINS {
            if !chains.iter().any(|c| c == base) {
                return Err(Error::MissingBaseChain(base.to_string()));
            }
        }

        let chain = &self.config.chain;
        if chains.iter().any(|c| c == chain) {
            return Ok(ChainStatus::AlreadyExists);
        }

        self.backend
            .clear_chain(protocol, FILTER_TABLE, chain)
            .await
            .map_err(|e| Error::Firewall(format!("failed to create {} chain: {}", chain, e)))?;

        let jump = vec!["-j".to_string(), chain.clone()];
        for base in BASE_CHAINS {
            self.backend
                .insert(protocol, FILTER_TABLE, base, 1, &jump)
                .await
                .map_err(|e| {
                    Error::Firewall(format!(
                        "failed to add {} chain to {} chain: {}",
                        chain, base, e
                    ))
                })?;
        }

        tracing::info!(protocol = %protocol, chain = %chain, "Ban chain created");
        Ok(ChainStatus::Created)
    }

    /// Run `action` (`add`, `delete` or `flush`) for `address`
    ///
    /// The action is parsed before anything touches the firewall, so an
    /// unknown action has no side effects. `address` must be a literal IP for
    /// `add` and `delete` and is ignored by `flush`.
    pub async fn apply(
        &self,
        protocol: Protocol,
        action: &str,
        address: &str,
    ) -> Result<ActionOutcome> {
        let action: Action = action.parse()?;
        self.run(protocol, action, address).await
    }

    /// Ban `address` in the chain of its own address family
    pub async fn ban(&self, address: &str) -> Result<ActionOutcome> {
        self.run(Protocol::detect(address)?, Action::Add, address).await
    }

    /// Lift a ban on `address` in the chain of its own address family
    pub async fn unban(&self, address: &str) -> Result<ActionOutcome> {
        self.run(Protocol::detect(address)?, Action::Delete, address).await
    }

    async fn run(
        &self,
        protocol: Protocol,
        action: Action,
        address: &str,
    ) -> Result<ActionOutcome> {
        if action != Action::Flush {
            Protocol::detect(address)?;
        }

        self.ensure_chain(protocol).await?;

        let chain = &self.config.chain;
        let rule = ban_rule(address, self.config.target);

        let outcome = match action {
            Action::Add => {
                if !self.backend.exists(protocol, FILTER_TABLE, chain, &rule).await? {
                    self.backend.append(protocol, FILTER_TABLE, chain, &rule).await?;
                }
                ActionOutcome::Added
            }
            Action::Delete => {
                if self.backend.exists(protocol, FILTER_TABLE, chain, &rule).await? {
                    self.backend.delete(protocol, FILTER_TABLE, chain, &rule).await?;
                }
                ActionOutcome::Deleted
            }
            Action::Flush => {
                self.backend.clear_chain(protocol, FILTER_TABLE, chain).await?;
                ActionOutcome::Flushed
            }
        };

        tracing::info!(
            protocol = %protocol,
            chain = %chain,
            address = %address,
            outcome = %outcome,
            "Ban chain updated"
        );
        Ok(outcome)
    }
}
