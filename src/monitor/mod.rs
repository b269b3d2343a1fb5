//! Monitor subsystem: talking to the Sentinel quorum.
//!
//! # Data Flow
//! ```text
//! settings.monitors (ordered)
//!     → client.rs connect (first endpoint that accepts wins)
//!     → resolver.rs (SENTINEL masters → FailoverEvent per group)
//!     → client.rs subscribe (+switch-master → SubscriptionEvent stream)
//!     → event.rs (strict payload parsing)
//! ```
//!
//! # Design Decisions
//! - Transport sits behind `MonitorConnector`/`MonitorLink` so the loop can run
//!   against scripted monitors in tests
//! - Fallback is ordered, never random: operators list the closest monitor first
//! - A subscription stream ends with `TransportError`; it is never resumed

pub mod client;
pub mod event;
pub mod redis;
pub mod resolver;

pub use client::{EventStream, MonitorClient, MonitorConnector, MonitorError, MonitorLink, SubscriptionEvent};
pub use event::{Endpoint, FailoverEvent, PrimaryInfo};
pub use self::redis::RedisConnector;
