//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Monitor connect:
//!     → timeouts.rs (optional per-endpoint deadline)
//! Subscription broken:
//!     → backoff.rs (delay between reconnect attempts)
//! ```
//!
//! # Design Decisions
//! - Defaults keep the single immediate reconnect attempt
//! - Backoff only ever delays the loop; it never skips reconciliation

pub mod backoff;
pub mod timeouts;
