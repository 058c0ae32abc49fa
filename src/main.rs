//! Fire weather datamart API server.
//!
//! # Architecture Overview
//!
//! ```text
//!   startup:  controllers ──declare──▶ registry ──materialize──▶ axum routes
//!
//!   request:  listener ─▶ server layers ─▶ route ─▶ middleware chain
//!                                                      │
//!                                                      ▼
//!             response ◀─ error stage ◀─ dispatcher ─▶ handler ─▶ store
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use datamart_api::config::{load_config, AppConfig};
use datamart_api::lifecycle::{build_application, open_store, spawn_signal_handler, Shutdown};
use datamart_api::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "datamart-api")]
#[command(about = "Fire weather datamart API", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the API (default)
    Serve,
    /// Print the route table and exit
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    let _log_guard = logging::init_logging(&config.logging);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "datamart-api starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        strict_routes = config.server.strict_routes,
        auth = config.auth.api_key.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = open_store(&config.store).await?;
    let app = build_application(&config, store)?;

    if let Some(Command::Routes) = cli.command {
        for route in &app.routes {
            println!("{:<7} {:<24} {}.{}", route.method.as_str(), route.path, route.controller, route.endpoint);
        }
        return Ok(());
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());
    app.server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
