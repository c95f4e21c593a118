//! In-memory packet filter for ban-chain tests

use async_trait::async_trait;
use kamkit_core::{Error, Result};
use kamkit_firewall::{FirewallBackend, Protocol};
use std::collections::HashMap;
use std::sync::Mutex;

type ChainKey = (Protocol, String);

/// Records every mutating call and keeps rules per (protocol, chain)
#[derive(Default)]
pub struct MemoryBackend {
    chains: Mutex<HashMap<ChainKey, Vec<Vec<String>>>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryBackend {
    /// Backend with the given built-in chains for both families
    pub fn with_chains(names: &[&str]) -> Self {
        let backend = Self::default();
        {
            let mut chains = backend.chains.lock().unwrap();
            for protocol in [Protocol::Ipv4, Protocol::Ipv6] {
                for name in names {
                    chains.insert((protocol, name.to_string()), Vec::new());
                }
            }
        }
        backend
    }

    /// Standard host: INPUT, FORWARD and OUTPUT
    pub fn standard() -> Self {
        Self::with_chains(&["INPUT", "FORWARD", "OUTPUT"])
    }

    pub fn rules(&self, protocol: Protocol, chain: &str) -> Option<Vec<Vec<String>>> {
        self.chains
            .lock()
            .unwrap()
            .get(&(protocol, chain.to_string()))
            .cloned()
    }

    /// Mutating calls in order, e.g. `"insert INPUT 1 -j APIBANLOCAL"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn with_chain<T>(
        &self,
        protocol: Protocol,
        chain: &str,
        f: impl FnOnce(&mut Vec<Vec<String>>) -> T,
    ) -> Result<T> {
        let mut chains = self.chains.lock().unwrap();
        let rules = chains
            .get_mut(&(protocol, chain.to_string()))
            .ok_or_else(|| {
                Error::Firewall(format!("No chain/target/match by that name: {}", chain))
            })?;
        Ok(f(rules))
    }
}

#[async_trait]
impl FirewallBackend for MemoryBackend {
    async fn list_chains(&self, protocol: Protocol, _table: &str) -> Result<Vec<String>> {
        Ok(self
            .chains
            .lock()
            .unwrap()
            .keys()
            .filter(|(p, _)| *p == protocol)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn clear_chain(&self, protocol: Protocol, _table: &str, chain: &str) -> Result<()> {
        self.record(format!("clear {}", chain));
        self.chains
            .lock()
            .unwrap()
            .insert((protocol, chain.to_string()), Vec::new());
        Ok(())
    }

    async fn insert(
        &self,
        protocol: Protocol,
        _table: &str,
        chain: &str,
        position: u32,
        rule: &[String],
    ) -> Result<()> {
        self.record(format!("insert {} {} {}", chain, position, rule.join(" ")));
        self.with_chain(protocol, chain, |rules| {
            let index = (position as usize).saturating_sub(1).min(rules.len());
            rules.insert(index, rule.to_vec());
        })
    }

    async fn exists(
        &self,
        protocol: Protocol,
        _table: &str,
        chain: &str,
        rule: &[String],
    ) -> Result<bool> {
        self.with_chain(protocol, chain, |rules| rules.iter().any(|r| r == rule))
    }

    async fn append(
        &self,
        protocol: Protocol,
        _table: &str,
        chain: &str,
        rule: &[String],
    ) -> Result<()> {
        self.record(format!("append {} {}", chain, rule.join(" ")));
        self.with_chain(protocol, chain, |rules| rules.push(rule.to_vec()))
    }

    async fn delete(
        &self,
        protocol: Protocol,
        _table: &str,
        chain: &str,
        rule: &[String],
    ) -> Result<()> {
        self.record(format!("delete {} {}", chain, rule.join(" ")));
        self.with_chain(protocol, chain, |rules| {
            if let Some(index) = rules.iter().position(|r| r == rule) {
                rules.remove(index);
            }
        })
    }
}
