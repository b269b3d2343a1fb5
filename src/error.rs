//! Top-level error type of the agent.

use thiserror::Error;

use crate::config::ConfigError;
use crate::monitor::MonitorError;
use crate::proxy::ReloadError;
use crate::routing::RoutingError;

/// Any error that can stop, or be reported by, the reconciliation loop.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Reload(#[from] ReloadError),
}

impl AgentError {
    /// Whether the loop has to stop. A failed reload leaves the routing file
    /// correct, so the loop keeps going and the next reload catches up.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AgentError::Reload(_))
    }

    /// Whether another reconnect attempt could help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::Monitor(
                MonitorError::NoReachableMonitor { .. }
                    | MonitorError::Unreachable { .. }
                    | MonitorError::Transport(_)
            )
        )
    }
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
