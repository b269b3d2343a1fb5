//! A single backend line of a proxy pool.
//!
//! The proxy stores servers as `"<address>:<port>:<weight> <name>"`. The
//! name is the join key used during failover; the address and port are the
//! parts that move.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Weight written for every entry the agent touches.
pub const DEFAULT_WEIGHT: u32 = 1;

/// Reasons a server line fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("empty server line")]
    Empty,

    #[error("server line '{0}' has no name")]
    MissingName(String),

    #[error("server line '{0}' has trailing tokens after the name")]
    TrailingTokens(String),

    #[error("server line '{0}' is not <address>:<port>:<weight>")]
    MalformedAddress(String),

    #[error("invalid port '{port}' in server line '{line}'")]
    InvalidPort { line: String, port: String },

    #[error("invalid weight '{weight}' in server line '{line}'")]
    InvalidWeight { line: String, weight: String },
}

/// One backend server of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerEntry {
    pub address: String,
    pub port: u16,
    pub weight: u32,
    pub name: String,
}

impl ServerEntry {
    pub fn new(address: impl Into<String>, port: u16, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port,
            weight: DEFAULT_WEIGHT,
            name: name.into(),
        }
    }

    /// `address:port`, the form compared during reconciliation.
    pub fn endpoint(&self) -> String {
        compose_address(&self.address, self.port)
    }
}

/// Join a host and port the way the proxy and the monitor both print them.
pub fn compose_address(address: &str, port: u16) -> String {
    format!("{}:{}", address, port)
}

impl FromStr for ServerEntry {
    type Err = EntryError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let target = tokens.next().ok_or(EntryError::Empty)?;
        let name = tokens
            .next()
            .ok_or_else(|| EntryError::MissingName(line.to_string()))?;
        if tokens.next().is_some() {
            return Err(EntryError::TrailingTokens(line.to_string()));
        }

        // Split from the right so the host part may itself contain colons.
        let mut parts = target.rsplitn(3, ':');
        let (weight, port, address) = match (parts.next(), parts.next(), parts.next()) {
            (Some(w), Some(p), Some(a)) if !a.is_empty() => (w, p, a),
            _ => return Err(EntryError::MalformedAddress(line.to_string())),
        };

        let port = port.parse::<u16>().map_err(|_| EntryError::InvalidPort {
            line: line.to_string(),
            port: port.to_string(),
        })?;
        let weight = weight.parse::<u32>().map_err(|_| EntryError::InvalidWeight {
            line: line.to_string(),
            weight: weight.to_string(),
        })?;

        Ok(Self {
            address: address.to_string(),
            port,
            weight,
            name: name.to_string(),
        })
    }
}

impl TryFrom<String> for ServerEntry {
    type Error = EntryError;

    fn try_from(line: String) -> Result<Self, Self::Error> {
        line.parse()
    }
}

impl From<ServerEntry> for String {
    fn from(entry: ServerEntry) -> Self {
        entry.to_string()
    }
}

impl fmt::Display for ServerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{} {}", self.address, self.port, self.weight, self.name)
    }
}
