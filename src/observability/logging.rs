//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Pick level from `RUST_LOG`, then `--verbose`, then settings
//! - Write pretty or JSON lines to stdout or an append-mode log file

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogFormat, ObservabilityConfig};

/// Directive used when neither `RUST_LOG` nor `--verbose` say otherwise.
pub fn default_directive(config: &ObservabilityConfig, verbose: bool) -> String {
    let level = if verbose { "debug" } else { config.log_level.as_str() };
    format!("sentinel_agent={}", level)
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig, verbose: bool) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(config, verbose).into());

    let layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            match config.log_format {
                LogFormat::Json => layer.json().boxed(),
                LogFormat::Pretty => layer.boxed(),
            }
        }
        None => match config.log_format {
            LogFormat::Json => fmt::layer().json().boxed(),
            LogFormat::Pretty => fmt::layer().boxed(),
        },
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
    Ok(())
}
