//! Proxy reload invocation.
//!
//! # Responsibilities
//! - Run the configured reload command with its arguments and extra env var
//! - Capture stdout and stderr for diagnostics
//! - Report launch failures and non-zero exits as `ReloadError`

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::config::AgentSettings;

/// The reload action failed. The routing file has already been written.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("cannot launch reload command '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("reload command '{command}' exited with {}: {output}", .status.map_or_else(|| "signal".to_string(), |c| format!("status {}", c)))]
    Failed {
        command: String,
        status: Option<i32>,
        /// Everything written to stdout, followed by everything written to stderr.
        output: String,
    },
}

/// Something that makes the proxy pick up its routing file.
#[async_trait]
pub trait ProxyReloader: Send + Sync {
    async fn reload(&self) -> Result<(), ReloadError>;
}

/// Reloads the proxy by running an external command.
#[derive(Debug, Clone)]
pub struct CommandReloader {
    command: String,
    args: Vec<String>,
    env: Option<(String, String)>,
}

impl CommandReloader {
    /// `args` is split on whitespace; `env` is a single `KEY=VALUE` pair.
    pub fn new(command: impl Into<String>, args: &str, env: Option<&str>) -> Self {
        Self {
            command: command.into(),
            args: args.split_whitespace().map(str::to_string).collect(),
            env: env
                .and_then(|kv| kv.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string())),
        }
    }

    pub fn from_settings(settings: &AgentSettings) -> Self {
        Self::new(
            settings.reload_command.clone(),
            &settings.reload_args,
            settings.reload_env.as_deref(),
        )
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl ProxyReloader for CommandReloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        tracing::debug!(command = %self.command, args = ?self.args, "Reloading proxy");

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        if let Some((key, value)) = &self.env {
            cmd.env(key, value);
        }

        let output = cmd.output().await.map_err(|source| ReloadError::Launch {
            command: self.command.clone(),
            source,
        })?;

        // stdout then stderr, not interleaved
        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            tracing::info!(command = %self.command, "Proxy reloaded");
            Ok(())
        } else {
            Err(ReloadError::Failed {
                command: self.command.clone(),
                status: output.status.code(),
                output: captured.trim().to_string(),
            })
        }
    }
}
