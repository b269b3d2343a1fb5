//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse flags → Load settings → Init logging/metrics → Load routing file → Run loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → loop stops waiting for notifications → Exit 0
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and exits non-zero
//! - Shutdown never interrupts a reconcile in progress

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
