//! insurance-agents
//!
//! Runs one agent per process:
//!
//! ```text
//! insurance-agents <aegis|architect|growth|oracle|sales> [--config PATH] [--bind ADDR]
//! ```
//!
//! # Startup
//!
//! ```text
//! load config (defaults → TOML file → environment) → validate
//!     → tracing subscriber → optional Prometheus exporter
//!     → integration clients → bind listener → serve until SIGINT/SIGTERM
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use insurance_agents::config::load_config_with;
use insurance_agents::lifecycle::signals;
use insurance_agents::observability::{init_tracing, metrics};
use insurance_agents::{AgentKind, AgentServer, AppState, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "insurance-agents", version, about = "Insurance agent HTTP services")]
struct Cli {
    /// Agent to serve.
    agent: AgentKind,

    /// TOML configuration file.
    #[arg(long, env = "AGENTS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address (e.g. 0.0.0.0:8080).
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config_with(cli.config.as_deref(), |config| {
        if let Some(bind) = cli.bind {
            config.listener.bind_address = bind;
        }
    })?;

    init_tracing(&config.observability);
    tracing::info!(
        agent = %cli.agent,
        version = env!("CARGO_PKG_VERSION"),
        llm_provider = %config.llm.provider,
        "insurance-agents starting"
    );

    let missing = cli.agent.missing_settings(&config);
    if !missing.is_empty() {
        tracing::warn!(
            agent = %cli.agent,
            missing = %missing.join(", "),
            "Agent settings missing; affected steps will fail or be skipped"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let state = AppState::from_config(config)?;
    let shutdown = Shutdown::new();
    tokio::spawn(signals::listen(shutdown.clone()));

    AgentServer::new(cli.agent, state)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
