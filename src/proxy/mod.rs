//! Proxy control: telling the running proxy to pick up its new server list.

pub mod controller;

pub use controller::{CommandReloader, ProxyReloader, ReloadError};
