//! The proxy's routing file held in memory.
//!
//! # Responsibilities
//! - Load pools from the proxy's YAML file
//! - Point a named member at a new address
//! - Write the file back atomically

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::entry::{compose_address, ServerEntry, DEFAULT_WEIGHT};

/// Errors raised while loading, saving or updating the routing table.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file does not describe a valid set of pools.
    #[error("malformed routing file {}: {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    #[error("pool '{0}' is not defined in the routing file")]
    UnknownPool(String),

    #[error("pool '{pool}' has no server named '{member}'")]
    UnknownMember { pool: String, member: String },

    /// The address could not be written back as a server line.
    #[error("address '{address}' for server '{member}' in pool '{pool}' is not usable")]
    InvalidAddress {
        pool: String,
        member: String,
        address: String,
    },
}

/// One proxy pool. Keys the agent does not interpret are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_eject_hosts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_connections: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_retry_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_failure_limit: Option<u32>,
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Pool {
    pub fn member(&self, name: &str) -> Option<&ServerEntry> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.servers.iter().map(|s| s.name.as_str())
    }
}

/// All pools of a proxy config file, keyed by pool name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable {
    pools: BTreeMap<String, Pool>,
}

impl RoutingTable {
    /// Read and validate a routing file.
    pub fn load(path: &Path) -> Result<Self, RoutingError> {
        tracing::debug!(path = %path.display(), "Loading routing table");
        let content = std::fs::read_to_string(path).map_err(|source| RoutingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|reason| RoutingError::Format {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse a routing table from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, String> {
        let table: RoutingTable = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        table.check_unique_members()?;
        Ok(table)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Write the table to `path`, replacing the file in one rename.
    pub fn save(&self, path: &Path) -> Result<(), RoutingError> {
        tracing::debug!(path = %path.display(), "Saving routing table");
        let io_err = |source: std::io::Error| RoutingError::Io {
            path: path.to_path_buf(),
            source,
        };
        let content = self.to_yaml().map_err(|e| RoutingError::Format {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    pub fn pool(&self, name: &str) -> Option<&Pool> {
        self.pools.get(name)
    }

    pub fn pool_names(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    /// Point `member` of `pool` at `address:port`.
    ///
    /// Returns `false` without touching anything when the member already
    /// has that address, so replayed notifications never cause a reload.
    pub fn update_member(
        &mut self,
        pool: &str,
        member: &str,
        address: &str,
        port: u16,
    ) -> Result<bool, RoutingError> {
        let servers = &mut self
            .pools
            .get_mut(pool)
            .ok_or_else(|| RoutingError::UnknownPool(pool.to_string()))?
            .servers;

        let entry = servers
            .iter_mut()
            .find(|s| s.name == member)
            .ok_or_else(|| RoutingError::UnknownMember {
                pool: pool.to_string(),
                member: member.to_string(),
            })?;

        if address.is_empty() || address.contains(char::is_whitespace) {
            return Err(RoutingError::InvalidAddress {
                pool: pool.to_string(),
                member: member.to_string(),
                address: address.to_string(),
            });
        }

        if entry.address == address && entry.port == port {
            tracing::debug!(pool, member, address = %compose_address(address, port), "Member already up to date");
            return Ok(false);
        }

        tracing::info!(
            pool,
            member,
            from = %entry.endpoint(),
            to = %compose_address(address, port),
            "Updating member address"
        );
        entry.address = address.to_string();
        entry.port = port;
        entry.weight = DEFAULT_WEIGHT;
        Ok(true)
    }

    fn check_unique_members(&self) -> Result<(), String> {
        for (pool_name, pool) in &self.pools {
            let mut seen = HashSet::new();
            for name in pool.member_names() {
                if !seen.insert(name) {
                    return Err(format!(
                        "pool '{}' lists server name '{}' more than once",
                        pool_name, name
                    ));
                }
            }
        }
        Ok(())
    }
}
