//! Routing subsystem: the proxy's pools and their backend servers.
//!
//! # Data Flow
//! ```text
//! proxy YAML file
//!     → table.rs (pools keyed by name, unknown keys preserved)
//!     → entry.rs (strict "<address>:<port>:<weight> <name>" lines)
//!     → update_member (name is the join key, address/port move)
//!     → table.rs save (temp file + rename)
//! ```

pub mod entry;
pub mod table;

pub use entry::{EntryError, ServerEntry};
pub use table::{Pool, RoutingError, RoutingTable};
