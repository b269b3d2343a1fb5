//! Sentinel-driven failover agent for twemproxy.
//!
//! Watches Redis Sentinel for `+switch-master` notifications and rewrites the
//! proxy's server list so each named member points at its current primary.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod proxy;
pub mod reconcile;
pub mod resilience;
pub mod routing;

pub use config::AgentSettings;
pub use error::{AgentError, AgentResult};
pub use lifecycle::Shutdown;
pub use reconcile::{LoopState, ReconciliationLoop};
