//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, or YAML for older deployments)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AgentSettings (validated, immutable)
//!     → handed to the reconciliation loop at startup
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The proxy's own routing file is not settings; see `routing`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, ConfigError};
pub use schema::AgentSettings;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ReconnectConfig;
