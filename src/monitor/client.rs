//! Monitor client with ordered endpoint fallback.
//!
//! # Responsibilities
//! - Connect to the first reachable monitor, in configured order
//! - Query the primaries the monitor tracks
//! - Open the failover notification subscription

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::monitor::event::PrimaryInfo;
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;

/// Errors that can occur while talking to the monitors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// A single endpoint refused or failed the connection.
    #[error("monitor {endpoint} unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    /// Every configured endpoint failed.
    #[error("no monitor reachable (tried {})", .attempted.join(", "))]
    NoReachableMonitor { attempted: Vec<String> },

    /// The monitor answered with something we cannot interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("monitor does not track a primary named '{0}'")]
    UnknownGroup(String),

    #[error("malformed notification '{payload}': {reason}")]
    MalformedNotification { payload: String, reason: String },

    /// The connection failed after it was established.
    #[error("transport error: {0}")]
    Transport(String),
}

/// One item read from a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// A published message.
    Data { channel: String, payload: String },
    /// The monitor confirmed the subscription.
    Ack { channel: String, count: usize },
    /// The subscription broke; nothing follows on this stream.
    TransportError(String),
}

/// Notifications from one subscription. Not restartable.
pub type EventStream = BoxStream<'static, SubscriptionEvent>;

/// An open connection to one monitor.
#[async_trait]
pub trait MonitorLink: Send {
    /// The endpoint this link is connected to.
    fn endpoint(&self) -> &str;

    /// Every primary the monitor currently tracks.
    async fn primaries(&mut self) -> Result<Vec<PrimaryInfo>, MonitorError>;

    /// Subscribe to `topic` on the same monitor.
    async fn subscribe(&mut self, topic: &str) -> Result<EventStream, MonitorError>;
}

/// Opens links to monitor endpoints.
#[async_trait]
pub trait MonitorConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn MonitorLink>, MonitorError>;
}

/// Client over the configured monitor set.
pub struct MonitorClient {
    endpoints: Vec<String>,
    connector: Box<dyn MonitorConnector>,
    connect_timeout: Option<Duration>,
}

impl MonitorClient {
    pub fn new(endpoints: Vec<String>, connector: impl MonitorConnector + 'static) -> Self {
        Self {
            endpoints,
            connector: Box::new(connector),
            connect_timeout: None,
        }
    }

    /// Bound each connection attempt. `None` waits as long as the OS does.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Connect to the first endpoint that accepts, trying them in order.
    pub async fn connect(&self) -> Result<Box<dyn MonitorLink>, MonitorError> {
        let mut attempted = Vec::with_capacity(self.endpoints.len());

        for endpoint in &self.endpoints {
            attempted.push(endpoint.clone());
            match with_timeout(self.connect_timeout, self.connector.connect(endpoint)).await {
                Ok(Ok(link)) => {
                    tracing::info!(endpoint = %endpoint, "Connected to monitor");
                    metrics::record_monitor_connect(endpoint, true);
                    return Ok(link);
                }
                Ok(Err(e)) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "Monitor is not reachable");
                }
                Err(_) => {
                    tracing::warn!(endpoint = %endpoint, "Monitor connection timed out");
                }
            }
            metrics::record_monitor_connect(endpoint, false);
        }

        Err(MonitorError::NoReachableMonitor { attempted })
    }

    /// The primary the monitor reports for `group`.
    pub async fn query(
        &self,
        link: &mut dyn MonitorLink,
        group: &str,
    ) -> Result<PrimaryInfo, MonitorError> {
        let primaries = link.primaries().await?;
        tracing::debug!(endpoint = %link.endpoint(), count = primaries.len(), "Queried primaries");
        primaries
            .into_iter()
            .find(|p| p.name == group)
            .ok_or_else(|| MonitorError::UnknownGroup(group.to_string()))
    }

    pub async fn subscribe(
        &self,
        link: &mut dyn MonitorLink,
        topic: &str,
    ) -> Result<EventStream, MonitorError> {
        tracing::debug!(endpoint = %link.endpoint(), topic, "Subscribing to monitor");
        link.subscribe(topic).await
    }
}

impl std::fmt::Debug for MonitorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorClient")
            .field("endpoints", &self.endpoints)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
