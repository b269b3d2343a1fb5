//! Settings validation.
//!
//! Serde handles the syntax; this pass checks the values the agent cannot run
//! without. Every problem is reported, not just the first one.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AgentSettings;

/// A single semantic problem found in the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate loaded settings.
pub fn validate_settings(settings: &AgentSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.pool_name.trim().is_empty() {
        errors.push(ValidationError::new("pool_name", "must not be empty"));
    }
    if settings.proxy_config_file.as_os_str().is_empty() {
        errors.push(ValidationError::new("proxy_config_file", "must not be empty"));
    }
    if settings.monitors.is_empty() {
        errors.push(ValidationError::new("monitors", "at least one endpoint is required"));
    }
    for endpoint in &settings.monitors {
        if !endpoint.contains(':') {
            errors.push(ValidationError::new(
                "monitors",
                format!("endpoint '{}' is not host:port", endpoint),
            ));
        }
    }
    if settings.topic.trim().is_empty() {
        errors.push(ValidationError::new("topic", "must not be empty"));
    }
    if settings.reload_command.trim().is_empty() {
        errors.push(ValidationError::new("reload_command", "must not be empty"));
    }
    if let Some(env) = &settings.reload_env {
        match env.split_once('=') {
            Some((key, _)) if !key.is_empty() => {}
            _ => errors.push(ValidationError::new(
                "reload_env",
                format!("'{}' is not KEY=VALUE", env),
            )),
        }
    }
    if settings.reconnect.max_attempts == 0 {
        errors.push(ValidationError::new("reconnect.max_attempts", "must be at least 1"));
    }
    if settings.observability.metrics_enabled
        && settings.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", settings.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
