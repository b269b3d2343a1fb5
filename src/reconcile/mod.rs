//! Reconciliation subsystem: the core failover loop.
//!
//! # Data Flow
//! ```text
//! MonitorClient → resolver / notification payload
//!     → FailoverEvent
//!     → reconciler.rs (update_member → save → reload)
//!     → event_loop.rs (state machine around the above)
//! ```
//!
//! # Design Decisions
//! - Single logical thread: one notification at a time, in arrival order
//! - The routing table is owned by the reconciler; nothing else touches it
//! - A failed reload never rolls back the written routing file

pub mod event_loop;
pub mod reconciler;

pub use event_loop::{LoopState, ReconciliationLoop};
pub use reconciler::{Reconciler, Reconciliation};
