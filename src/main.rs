//! sentinel-agent
//!
//! Keeps a twemproxy pool pointed at the primaries elected by Redis Sentinel.
//!
//! # Architecture Overview
//!
//! ```text
//!   Sentinel quorum                      sentinel-agent                          twemproxy
//!  ┌──────────────┐   SENTINEL masters  ┌────────────────────────────────┐
//!  │ sentinel #1  │◀────────────────────│ monitor   (ordered fallback)   │
//!  │ sentinel #2  │  +switch-master     │     │                          │
//!  │ ...          │────────────────────▶│     ▼                          │
//!  └──────────────┘                     │ reconcile (state machine)      │
//!                                       │     │                          │
//!                                       │     ▼                          │  write   ┌──────────────┐
//!                                       │ routing   (YAML pools)         │─────────▶│nutcracker.yml│
//!                                       │     │                          │          └──────────────┘
//!                                       │     ▼                          │  exec    ┌──────────────┐
//!                                       │ proxy     (reload command)     │─────────▶│  reload      │
//!                                       └────────────────────────────────┘          └──────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use sentinel_agent::config::{load_settings, AgentSettings};
use sentinel_agent::lifecycle::{signals, Shutdown};
use sentinel_agent::monitor::{MonitorClient, RedisConnector};
use sentinel_agent::observability::{logging, metrics};
use sentinel_agent::proxy::CommandReloader;
use sentinel_agent::reconcile::{Reconciler, ReconciliationLoop};
use sentinel_agent::AgentError;

#[derive(Parser)]
#[command(name = "sentinel-agent")]
#[command(about = "Rewrites twemproxy's server list on Redis Sentinel failovers", long_about = None)]
struct Cli {
    /// Settings file (TOML, or YAML when it ends in .yml/.yaml).
    #[arg(short, long, default_value = "conf/agent.toml")]
    config: PathBuf,

    /// Log at debug level.
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("sentinel-agent: cannot load {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&settings.observability, cli.verbose) {
        eprintln!("sentinel-agent: cannot open log file: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("sentinel-agent v{} starting", env!("CARGO_PKG_VERSION"));

    match run(settings).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "sentinel-agent exiting on fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: AgentSettings) -> Result<(), AgentError> {
    tracing::info!(
        pool = %settings.pool_name,
        proxy_config = %settings.proxy_config_file.display(),
        monitors = ?settings.monitors,
        topic = %settings.topic,
        "Configuration loaded"
    );

    if settings.observability.metrics_enabled {
        if let Ok(addr) = settings.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let reconciler = Reconciler::load(
        settings.pool_name.clone(),
        &settings.proxy_config_file,
        CommandReloader::from_settings(&settings),
    )?;

    let monitor = MonitorClient::new(settings.monitors.clone(), RedisConnector)
        .with_connect_timeout(settings.connect_timeout());

    let mut agent = ReconciliationLoop::new(
        monitor,
        reconciler,
        settings.topic.clone(),
        settings.reconnect.clone(),
    );

    let shutdown = Arc::new(Shutdown::new());
    let stop = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal(&signal_shutdown).await;
    });

    agent.run(stop).await
}
