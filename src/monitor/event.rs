//! Values produced by the monitor: primaries and failover events.

use std::fmt;

use crate::monitor::MonitorError;
use crate::routing::entry::compose_address;

/// A host and port as reported by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&compose_address(&self.host, self.port))
    }
}

/// The primary the monitor currently reports for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryInfo {
    pub name: String,
    pub address: String,
    pub port: u16,
}

impl PrimaryInfo {
    /// Parse one entry of a `SENTINEL masters` reply.
    ///
    /// The reply is a flat field/value list; name, ip and port sit at fixed
    /// positions and their keys are checked before the values are trusted.
    pub fn from_fields(fields: &[String]) -> Result<Self, MonitorError> {
        if fields.len() < 6 {
            return Err(MonitorError::Protocol(format!(
                "primary entry has {} fields, expected at least 6",
                fields.len()
            )));
        }
        expect_key(fields, 0, "name")?;
        expect_key(fields, 2, "ip")?;
        expect_key(fields, 4, "port")?;

        let name = &fields[1];
        if name.is_empty() {
            return Err(MonitorError::Protocol("primary entry has an empty name".into()));
        }
        let address = &fields[3];
        if address.is_empty() {
            return Err(MonitorError::Protocol(format!("primary '{}' has an empty ip", name)));
        }
        let port = fields[5].parse::<u16>().map_err(|_| {
            MonitorError::Protocol(format!("primary '{}' has invalid port '{}'", name, fields[5]))
        })?;

        Ok(Self {
            name: name.clone(),
            address: address.clone(),
            port,
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.address.clone(), self.port)
    }
}

fn expect_key(fields: &[String], index: usize, key: &str) -> Result<(), MonitorError> {
    if fields[index] == key {
        Ok(())
    } else {
        Err(MonitorError::Protocol(format!(
            "expected field '{}' at position {}, found '{}'",
            key, index, fields[index]
        )))
    }
}

/// Parse a whole `SENTINEL masters` reply.
pub fn parse_primaries(rows: &[Vec<String>]) -> Result<Vec<PrimaryInfo>, MonitorError> {
    rows.iter().map(|row| PrimaryInfo::from_fields(row)).collect()
}

/// A primary moved, or must be confirmed, for one named group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverEvent {
    /// Group name, which is also the proxy member name.
    pub name: String,
    /// Previous primary. Unknown when the event comes from a startup query.
    pub old: Option<Endpoint>,
    pub new: Endpoint,
}

impl FailoverEvent {
    /// Event forcing `primary` as the truth, regardless of what came before.
    pub fn current(primary: PrimaryInfo) -> Self {
        let new = primary.endpoint();
        Self {
            name: primary.name,
            old: None,
            new,
        }
    }

    /// Parse a `+switch-master` payload:
    /// `"<name> <old-ip> <old-port> <new-ip> <new-port>"`.
    pub fn from_payload(payload: &str) -> Result<Self, MonitorError> {
        let malformed = |reason: String| MonitorError::MalformedNotification {
            payload: payload.to_string(),
            reason,
        };

        let fields: Vec<&str> = payload.trim_end_matches(['\r', '\n']).split(' ').collect();
        if fields.len() != 5 {
            return Err(malformed(format!("expected 5 fields, found {}", fields.len())));
        }
        if let Some(pos) = fields.iter().position(|f| f.is_empty()) {
            return Err(malformed(format!("field {} is empty", pos + 1)));
        }

        let port = |raw: &str| {
            raw.parse::<u16>()
                .map_err(|_| malformed(format!("invalid port '{}'", raw)))
        };

        Ok(Self {
            name: fields[0].to_string(),
            old: Some(Endpoint::new(fields[1], port(fields[2])?)),
            new: Endpoint::new(fields[3], port(fields[4])?),
        })
    }
}

impl fmt::Display for FailoverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.old {
            Some(old) => write!(f, "{} {} -> {}", self.name, old, self.new),
            None => write!(f, "{} -> {}", self.name, self.new),
        }
    }
}
