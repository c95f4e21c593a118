//! Packet-filter backends
//!
//! [`FirewallBackend`] is the seam between ban-chain logic and the host.
//! Operations mirror the `iptables` command set one to one; composite
//! behaviors such as "append unless present" are built on top of them in
//! [`crate::Firewall`].
//!
//! [`IptablesCommand`] is the production backend. It runs `iptables` or
//! `ip6tables` through `tokio::process` and waits for the xtables lock.

use crate::rule::Protocol;
use async_trait::async_trait;
use kamkit_core::{Error, Result};
use tokio::process::Command;

/// Operations on one table of the host packet filter
#[async_trait]
pub trait FirewallBackend: Send + Sync {
    /// Names of every chain in `table`, built-in and user-defined
    async fn list_chains(&self, protocol: Protocol, table: &str) -> Result<Vec<String>>;

    /// Create `chain`, or empty it if it already exists
    async fn clear_chain(&self, protocol: Protocol, table: &str, chain: &str) -> Result<()>;

    /// Insert `rule` at 1-based `position` of `chain`
    async fn insert(
        &self,
        protocol: Protocol,
        table: &str,
        chain: &str,
        position: u32,
        rule: &[String],
    ) -> Result<()>;

    /// Whether an identical `rule` is present in `chain`
    async fn exists(
        &self,
        protocol: Protocol,
        table: &str,
        chain: &str,
        rule: &[String],
    ) -> Result<bool>;

    /// Append `rule` to `chain`
    async fn append(
        &self,
        protocol: Protocol,
        table: &str,
        chain: &str,
        rule: &[String],
    ) -> Result<()>;

    /// Delete the first rule of `chain` identical to `rule`
    async fn delete(
        &self,
        protocol: Protocol,
        table: &str,
        chain: &str,
        rule: &[String],
    ) -> Result<()>;
}

/// Backend that shells out to `iptables`/`ip6tables`
#[derive(Debug, Clone, Default)]
pub struct IptablesCommand;

impl IptablesCommand {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, protocol: Protocol, args: &[String]) -> Result<std::process::Output> {
        tracing::trace!(binary = protocol.binary(), args = ?args, "Running packet filter command");
        Command::new(protocol.binary())
            .args(args)
            .output()
            .await
            .map_err(|e| Error::Firewall(format!("failed to run {}: {}", protocol.binary(), e)))
    }

    async fn run_ok(&self, protocol: Protocol, args: Vec<String>) -> Result<String> {
        let output = self.run(protocol, &args).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(command_failure(protocol, &output))
        }
    }
}

fn command_failure(protocol: Protocol, output: &std::process::Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    Error::Firewall(format!(
        "{} exited with {}: {}",
        protocol.binary(),
        output.status,
        stderr.trim()
    ))
}

/// `--wait -t <table> <op> <chain> [extra...] [rule...]`
fn command_args(
    table: &str,
    op: &str,
    chain: &str,
    extra: &[String],
    rule: &[String],
) -> Vec<String> {
    let mut args = vec![
        "--wait".to_string(),
        "-t".to_string(),
        table.to_string(),
        op.to_string(),
    ];
    if !chain.is_empty() {
        args.push(chain.to_string());
    }
    args.extend(extra.iter().cloned());
    args.extend(rule.iter().cloned());
    args
}

/// Chain names from `iptables -S` output
///
/// Built-in chains appear as `-P <chain> <policy>`, user chains as
/// `-N <chain>`.
fn parse_chain_listing(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("-P") | Some("-N"), Some(chain)) => Some(chain.to_string()),
                _ => None,
            }
        })
        .collect()
}

#[async_trait]
impl FirewallBackend for IptablesCommand {
    async fn list_chains(&self, protocol: Protocol, table: &str) -> Result<Vec<String>> {
        let listing = self
            .run_ok(protocol, command_args(table, "-S", "", &[], &[]))
            .await?;
        Ok(parse_chain_listing(&listing))
    }

    async fn clear_chain(&self, protocol: Protocol, table: &str, chain: &str) -> Result<()> {
        let chains = self.list_chains(protocol, table).await?;
        let op = if chains.iter().any(|c| c == chain) { "-F" } else { "-N" };
        self.run_ok(protocol, command_args(table, op, chain, &[], &[]))
            .await
            .map(|_| ())
    }

    async fn insert(
        &self,
        protocol: Protocol,
        table: &str,
        chain: &str,
        position: u32,
        rule: &[String],
    ) -> Result<()> {
        self.run_ok(protocol, command_args(table, "-I", chain, &[position.to_string()], rule))
            .await
            .map(|_| ())
    }

    async fn exists(
        &self,
        protocol: Protocol,
        table: &str,
        chain: &str,
        rule: &[String],
    ) -> Result<bool> {
        let output = self
            .run(protocol, &command_args(table, "-C", chain, &[], rule))
            .await?;
        match output.status.code() {
            Some(0) => Ok(true),
            // iptables reports a missing rule with status 1
            Some(1) => Ok(false),
            _ => Err(command_failure(protocol, &output)),
        }
    }

    async fn append(
        &self,
        protocol: Protocol,
        table: &str,
        chain: &str,
        rule: &[String],
    ) -> Result<()> {
        self.run_ok(protocol, command_args(table, "-A", chain, &[], rule))
            .await
            .map(|_| ())
    }

    async fn delete(
        &self,
        protocol: Protocol,
        table: &str,
        chain: &str,
        rule: &[String],
    ) -> Result<()> {
        self.run_ok(protocol, command_args(table, "-D", chain, &[], rule))
            .await
            .map(|_| ())
    }
}
