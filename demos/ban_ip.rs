//! Ban-chain example
//!
//! Adds, deletes or flushes local bans. Needs root privileges.
//!
//! Run with: cargo run --example ban_ip -- add 203.0.113.7

use kamkit::firewall::{Firewall, FirewallConfig, IptablesCommand, Protocol};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let action = args.next().unwrap_or_else(|| "add".to_string());
    let address = args.next().unwrap_or_default();

    let protocol = if address.is_empty() {
        Protocol::Ipv4
    } else {
        Protocol::detect(&address)?
    };

    let firewall = Firewall::new(IptablesCommand::new(), FirewallConfig::from_env()?);
    let outcome = firewall.apply(protocol, &action, &address).await?;

    println!("{} {} in {}: {}", protocol, address, firewall.config().chain, outcome);
    Ok(())
}
