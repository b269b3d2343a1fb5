//! The failover reconciliation loop.
//!
//! # States
//! - Starting: connect, resolve every member's primary, reconcile, subscribe
//! - Subscribed: reconcile each `+switch-master` notification in order
//! - Reconnecting: the subscription broke; redo the Starting sequence
//! - Terminated: an unrecoverable error (or shutdown) ended the loop
//!
//! # State Transitions
//! ```text
//! Starting → Subscribed: monitor reachable, startup reconcile succeeded
//! Starting → Terminated: no monitor reachable, or any fatal error
//! Subscribed → Reconnecting: transport error on the subscription
//! Reconnecting → Subscribed: Starting sequence succeeded again
//! Reconnecting → Terminated: every reconnect attempt failed
//! ```

use tokio::sync::broadcast;
use futures_util::StreamExt;

use crate::config::ReconnectConfig;
use crate::error::AgentError;
use crate::monitor::resolver::resolve_current;
use crate::monitor::{EventStream, FailoverEvent, MonitorClient, MonitorError, SubscriptionEvent};
use crate::observability::metrics;
use crate::proxy::ProxyReloader;
use crate::reconcile::reconciler::Reconciler;
use crate::resilience::backoff::calculate_backoff;

/// Where the loop is in its lifecycle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting = 0,
    Subscribed = 1,
    Reconnecting = 2,
    Terminated = 3,
}

/// Metrics label for a data message received on `channel`.
fn data_kind(channel: &str, topic: &str) -> &'static str {
    if channel == topic {
        "data"
    } else {
        "other_channel"
    }
}

/// Keeps one proxy pool pointed at the primaries the monitors report.
pub struct ReconciliationLoop<R> {
    monitor: MonitorClient,
    reconciler: Reconciler<R>,
    topic: String,
    reconnect: ReconnectConfig,
    state: LoopState,
}

impl<R: ProxyReloader> ReconciliationLoop<R> {
    pub fn new(
        monitor: MonitorClient,
        reconciler: Reconciler<R>,
        topic: impl Into<String>,
        reconnect: ReconnectConfig,
    ) -> Self {
        Self {
            monitor,
            reconciler,
            topic: topic.into(),
            reconnect,
            state: LoopState::Starting,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn reconciler(&self) -> &Reconciler<R> {
        &self.reconciler
    }

    /// Run until shutdown (`Ok`) or an unrecoverable error (`Err`).
    ///
    /// Notifications are handled strictly one after another; shutdown is only
    /// observed between them.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), AgentError> {
        self.transition(LoopState::Starting);
        let mut events = match self.establish().await {
            Ok(events) => events,
            Err(e) => return Err(self.terminate(e)),
        };
        self.transition(LoopState::Subscribed);

        loop {
            let event = tokio::select! {
                next = events.next() => next.unwrap_or_else(|| {
                    SubscriptionEvent::TransportError("subscription stream ended".to_string())
                }),
                _ = shutdown.recv() => {
                    tracing::info!(pool = %self.reconciler.pool(), "Shutdown requested, leaving reconciliation loop");
                    self.transition(LoopState::Terminated);
                    return Ok(());
                }
            };

            match event {
                SubscriptionEvent::Data { channel, payload } => {
                    metrics::record_notification(data_kind(&channel, &self.topic));
                    if channel != self.topic {
                        tracing::debug!(channel = %channel, "Ignoring message on unexpected channel");
                        continue;
                    }
                    tracing::debug!(channel = %channel, payload = %payload, "Received notification");
                    if let Err(e) = self.handle_notification(&payload).await {
                        return Err(self.terminate(e));
                    }
                }
                SubscriptionEvent::Ack { channel, count } => {
                    metrics::record_notification("ack");
                    tracing::info!(channel = %channel, count, "Subscription confirmed");
                }
                SubscriptionEvent::TransportError(reason) => {
                    metrics::record_notification("transport_error");
                    tracing::warn!(reason = %reason, "Subscription error, reconnecting to monitors");
                    self.transition(LoopState::Reconnecting);
                    events = match self.reconnect().await {
                        Ok(events) => events,
                        Err(e) => return Err(self.terminate(e)),
                    };
                    self.transition(LoopState::Subscribed);
                }
            }
        }
    }

    /// Connect, force every member to the current primary, then subscribe.
    async fn establish(&mut self) -> Result<EventStream, AgentError> {
        let mut link = self.monitor.connect().await?;

        for member in self.reconciler.member_names() {
            match resolve_current(&self.monitor, link.as_mut(), &member).await {
                Ok(event) => self.reconcile(&event).await?,
                Err(MonitorError::UnknownGroup(group)) => {
                    tracing::warn!(
                        pool = %self.reconciler.pool(),
                        member = %group,
                        "Monitor does not track this member, leaving it as configured"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let events = self.monitor.subscribe(link.as_mut(), &self.topic).await?;
        tracing::info!(endpoint = %link.endpoint(), topic = %self.topic, "Subscribed to failover notifications");
        Ok(events)
    }

    async fn reconnect(&mut self) -> Result<EventStream, AgentError> {
        let attempts = self.reconnect.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            let delay = calculate_backoff(attempt, self.reconnect.base_delay_ms, self.reconnect.max_delay_ms);
            if !delay.is_zero() {
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Waiting before reconnect");
                tokio::time::sleep(delay).await;
            }

            match self.establish().await {
                Ok(events) => return Ok(events),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt = attempt + 1, of = attempts, error = %e, "Reconnect attempt failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            MonitorError::NoReachableMonitor {
                attempted: self.monitor.endpoints().to_vec(),
            }
            .into()
        }))
    }

    async fn handle_notification(&mut self, payload: &str) -> Result<(), AgentError> {
        match FailoverEvent::from_payload(payload) {
            Ok(event) => {
                tracing::info!(pool = %self.reconciler.pool(), event = %event, "Failover notification");
                self.reconcile(&event).await
            }
            Err(e) => {
                tracing::error!(error = %e, "Skipping malformed failover notification");
                Ok(())
            }
        }
    }

    /// Reconcile one event; reload failures are logged and swallowed.
    async fn reconcile(&mut self, event: &FailoverEvent) -> Result<(), AgentError> {
        match self.reconciler.apply(event).await {
            Ok(_) => Ok(()),
            Err(e) if !e.is_fatal() => {
                tracing::error!(
                    pool = %self.reconciler.pool(),
                    member = %event.name,
                    address = %event.new,
                    error = %e,
                    "Proxy reload failed, routing file keeps the new address"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    pool = %self.reconciler.pool(),
                    member = %event.name,
                    address = %event.new,
                    error = %e,
                    "Reconciliation failed"
                );
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "Loop state change");
        }
        self.state = next;
        metrics::record_loop_state(next as u8);
    }

    fn terminate(&mut self, error: AgentError) -> AgentError {
        tracing::error!(
            pool = %self.reconciler.pool(),
            state = ?self.state,
            error = %error,
            "Reconciliation loop terminated"
        );
        self.transition(LoopState::Terminated);
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_topic_messages_count_as_data() {
        assert_eq!(data_kind("+switch-master", "+switch-master"), "data");
        assert_eq!(data_kind("+sdown", "+switch-master"), "other_channel");
    }
}
