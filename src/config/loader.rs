//! Settings loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AgentSettings;
use crate::config::validation::{validate_settings, ValidationError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate settings.
///
/// Files ending in `.yml` or `.yaml` are parsed as YAML, anything else as TOML.
pub fn load_settings(path: &Path) -> Result<AgentSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let settings: AgentSettings = match path.extension().and_then(|e| e.to_str()) {
        Some("yml") | Some("yaml") => serde_yaml::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };

    validate_settings(&settings).map_err(ConfigError::Validation)?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_toml_settings() {
        let file = write_temp(
            ".toml",
            r#"
pool_name = "alpha"
proxy_config_file = "/etc/nutcracker.yml"
monitors = ["10.0.0.1:26379", "10.0.0.2:26379"]
reload_command = "/usr/bin/systemctl"
reload_args = "restart nutcracker"
reload_env = "NUTCRACKER_OPTS=-v 6"

[reconnect]
max_attempts = 3

[observability]
log_format = "json"
"#,
        );

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.pool_name, "alpha");
        assert_eq!(settings.monitors.len(), 2);
        assert_eq!(settings.topic, "+switch-master");
        assert_eq!(settings.reconnect.max_attempts, 3);
        assert_eq!(settings.reconnect.base_delay_ms, 500);
        assert_eq!(settings.observability.log_format, crate::config::LogFormat::Json);
        assert!(settings.connect_timeout().is_none());
    }

    #[test]
    fn test_load_legacy_yaml_settings() {
        let file = write_temp(
            ".yml",
            r#"
twemproxy_pool_name: alpha
twemproxy_config_file: /etc/nutcracker.yml
sentinels:
  - 10.0.0.1:26379
restart_command: /etc/init.d/nutcracker
restart_args: restart
"#,
        );

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.pool_name, "alpha");
        assert_eq!(settings.monitors, vec!["10.0.0.1:26379".to_string()]);
        assert_eq!(settings.reload_command, "/etc/init.d/nutcracker");
        assert_eq!(settings.reload_args, "restart");
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let file = write_temp(".toml", "pool_name = \"alpha\"\n");
        match load_settings(file.path()) {
            Err(ConfigError::Validation(errors)) => assert!(!errors.is_empty()),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_settings(Path::new("/nonexistent/agent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
