//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and the loop state gauge)
//!
//! Consumers:
//!     → stdout or the configured log file
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every fatal path logs pool, member and addresses before returning
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
