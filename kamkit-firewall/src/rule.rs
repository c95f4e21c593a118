//! Value types for ban-chain operations

use kamkit_core::{Error, Result};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Address family, which selects `iptables` or `ip6tables`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Ipv4,
    Ipv6,
}

impl Protocol {
    /// Family of a literal IP address
    ///
    /// ```rust
    /// use kamkit_firewall::Protocol;
    ///
    /// assert_eq!(Protocol::detect("203.0.113.7").unwrap(), Protocol::Ipv4);
    /// assert_eq!(Protocol::detect("2001:db8::1").unwrap(), Protocol::Ipv6);
    /// assert!(Protocol::detect("example.com").is_err());
    /// ```
    pub fn detect(address: &str) -> Result<Self> {
        match address.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => Ok(Protocol::Ipv4),
            Ok(IpAddr::V6(_)) => Ok(Protocol::Ipv6),
            Err(_) => Err(Error::InvalidAddress(address.to_string())),
        }
    }

    /// Protocol by name; anything but `ipv6` means IPv4
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("ipv6") {
            Protocol::Ipv6
        } else {
            Protocol::Ipv4
        }
    }

    /// Binary that manages this family's tables
    pub fn binary(self) -> &'static str {
        match self {
            Protocol::Ipv4 => "iptables",
            Protocol::Ipv6 => "ip6tables",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Ipv4 => write!(f, "ipv4"),
            Protocol::Ipv6 => write!(f, "ipv6"),
        }
    }
}

/// Whether `text` is a literal IPv4 or IPv6 address
pub fn is_ip_address(text: &str) -> bool {
    text.parse::<IpAddr>().is_ok()
}

/// What to do with the ban chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Append a ban rule unless an identical one exists
    Add,
    /// Remove the ban rule if present
    Delete,
    /// Remove every rule from the chain
    Flush,
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(Action::Add),
            "delete" => Ok(Action::Delete),
            "flush" => Ok(Action::Flush),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

/// Jump target for banned sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BanTarget {
    #[default]
    Reject,
    Drop,
}

impl BanTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            BanTarget::Reject => "REJECT",
            BanTarget::Drop => "DROP",
        }
    }
}

impl FromStr for BanTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "REJECT" => Ok(BanTarget::Reject),
            "DROP" => Ok(BanTarget::Drop),
            _ => Err(Error::Config(format!("ban target must be REJECT or DROP, got {:?}", s))),
        }
    }
}

/// Result of making sure the ban chain is in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStatus {
    AlreadyExists,
    Created,
}

/// Result of a successful [`Action`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Added,
    Deleted,
    Flushed,
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Added => write!(f, "added"),
            ActionOutcome::Deleted => write!(f, "deleted"),
            ActionOutcome::Flushed => write!(f, "flushed"),
        }
    }
}

/// Rule arguments that bans `address` with `target`
pub fn ban_rule(address: &str, target: BanTarget) -> Vec<String> {
    ["-s", address, "-d", "0/0", "-j", target.as_str()]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
