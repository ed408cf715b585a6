//! Starboard access gate
//!
//! Request routing and workspace-aware access control for the Starboard site.

use clap::Parser;
use starboard_gate::{
    auth::create_identity_oracle,
    config::{LogFormat, load_config},
    gate::AccessGate,
    transport::{AppState, HttpConfig, UpstreamClient, run_http_blocking},
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Starboard access gate - classifies every request before the site renders it
#[derive(Parser, Debug)]
#[command(name = "starboard-gate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "STARBOARD_GATE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "STARBOARD_GATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Listen host; overrides the config file
    #[arg(long, env = "STARBOARD_GATE_HOST")]
    host: Option<String>,

    /// Listen port; overrides the config file
    #[arg(long, env = "STARBOARD_GATE_PORT")]
    port: Option<u16>,

    /// Upstream renderer URL; overrides the config file
    #[arg(long)]
    upstream: Option<String>,
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&log_level, config.logging.format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Starboard access gate"
    );

    if let Some(upstream) = args.upstream {
        config.server.upstream = Some(upstream);
    }
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    // Every collaborator is built here, once, and shared through AppState
    let gate = AccessGate::new(&config.gate, &config.routes)
        .inspect_err(|e| error!(error = %e, "Failed to compile route tables"))?;

    let oracle = create_identity_oracle(&config.auth)
        .inspect_err(|e| error!(error = %e, "Failed to create identity oracle"))?;

    let upstream = UpstreamClient::from_config(&config.server)
        .inspect_err(|e| error!(error = %e, "Failed to create upstream client"))?;

    if upstream.is_none() {
        info!("No upstream configured; allowed requests without a local route get 404");
    }

    let state = AppState::new(gate, oracle, upstream);
    let http_config = HttpConfig::from_host_port(&host, port)?;

    run_http_blocking(state, http_config).await?;

    Ok(())
}
