//! Configuration schema definitions.
//!
//! This module defines the complete settings structure for the agent.
//! All types derive `Deserialize` for reading config files.
//! Key aliases accept the older agent's YAML settings unchanged.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default notification channel Sentinel publishes failovers on.
pub const DEFAULT_TOPIC: &str = "+switch-master";

/// Root settings for the agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Proxy pool whose servers track the monitored primaries.
    #[serde(alias = "twemproxy_pool_name")]
    pub pool_name: String,

    /// Path of the proxy's YAML routing file.
    #[serde(alias = "twemproxy_config_file")]
    pub proxy_config_file: PathBuf,

    /// Monitor endpoints (`host:port`), tried in order.
    #[serde(alias = "sentinels")]
    pub monitors: Vec<String>,

    /// Pub/sub channel carrying failover notifications.
    pub topic: String,

    /// Executable invoked to reload the proxy.
    #[serde(alias = "restart_command")]
    pub reload_command: String,

    /// Space-separated arguments for the reload command.
    #[serde(alias = "restart_args")]
    pub reload_args: String,

    /// One extra `KEY=VALUE` environment variable for the reload command.
    #[serde(alias = "restart_env")]
    pub reload_env: Option<String>,

    /// Deadline for establishing a monitor connection. None waits indefinitely.
    pub connect_timeout_ms: Option<u64>,

    /// Reconnect policy after the subscription breaks.
    pub reconnect: ReconnectConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            pool_name: String::new(),
            proxy_config_file: PathBuf::new(),
            monitors: Vec::new(),
            topic: DEFAULT_TOPIC.to_string(),
            reload_command: String::new(),
            reload_args: String::new(),
            reload_env: None,
            connect_timeout_ms: None,
            reconnect: ReconnectConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AgentSettings {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

/// Reconnect configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Attempts made after a transport error before giving up.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Append logs to this file instead of stdout.
    pub log_file: Option<PathBuf>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_file: None,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
