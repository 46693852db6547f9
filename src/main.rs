//! graphrag-api - GraphRAG backend service
//!
//! # Usage
//!
//! ```bash
//! # Serve on 0.0.0.0:8000 with docker-compose defaults
//! graphrag-api
//!
//! # One-shot dependency check (exit code 1 when degraded)
//! graphrag-api check
//!
//! # Show resolved settings with secrets redacted
//! graphrag-api --config graphrag.toml print-config
//! ```
//!
//! # Environment Variables
//!
//! | Variable          | Default                 |
//! |-------------------|-------------------------|
//! | `ENVIRONMENT`     | `development`           |
//! | `LOG_LEVEL`       | `INFO`                  |
//! | `FRONTEND_DOMAIN` | unset (any CORS origin) |
//! | `NEO4J_URL`       | `neo4j://neo4j:7687`    |
//! | `NEO4J_USERNAME`  | `neo4j`                 |
//! | `NEO4J_PASSWORD`  | `password`              |
//! | `QDRANT_URL`      | `http://qdrant:6333`    |
//! | `QDRANT_API_KEY`  | unset                   |
//! | `REDIS_URL`       | `redis://redis:6379`    |
//! | `RUST_LOG`        | overrides `LOG_LEVEL`   |

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use graphrag_api::api::{create_app, AppState};
use graphrag_api::config::{ConfigSources, LoadedSettings, Settings};
use graphrag_api::health::HealthAggregator;
use graphrag_api::lifecycle::LifecycleManager;
use graphrag_api::stores::StoreConnectors;
use graphrag_api::telemetry;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "graphrag-api")]
#[command(about = "GraphRAG API service: store lifecycle and health reporting")]
#[command(version)]
struct CliArgs {
    /// TOML settings file (default: ./graphrag.toml if present)
    #[arg(long, env = "GRAPHRAG_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Dotenv file (default: ./.env if present)
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Override the listen address (default: "0.0.0.0:8000")
    #[arg(short, long, value_name = "HOST:PORT")]
    addr: Option<String>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug, Default)]
enum SubCommand {
    /// Run the HTTP server
    #[default]
    Serve,
    /// Connect to every store once, print the health report, and exit
    Check,
    /// Print resolved settings as TOML with secrets redacted
    PrintConfig,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let sources = ConfigSources::discover(args.config, args.env_file);
    let LoadedSettings {
        mut settings,
        warnings,
        file,
        env_file,
    } = Settings::load(&sources).context("Failed to load settings")?;

    if let Some(addr) = args.addr {
        settings.server.addr = addr;
        settings.validate().context("Invalid --addr")?;
    }

    telemetry::init_tracing(&settings);

    match &file {
        Some(path) => info!(path = %path.display(), "Loaded settings file"),
        None => info!("No settings file found, using defaults and environment"),
    }
    if let Some(path) = &env_file {
        info!(path = %path.display(), "Loaded env file");
    }
    for warning in &warnings {
        warn!("{warning}");
    }

    let settings = Arc::new(settings);
    match args.command.unwrap_or_default() {
        SubCommand::Serve => serve(settings).await,
        SubCommand::Check => check(settings).await,
        SubCommand::PrintConfig => {
            print!("{}", settings.redacted().to_toml()?);
            Ok(())
        }
    }
}

fn build_lifecycle(settings: &Settings) -> Arc<LifecycleManager> {
    Arc::new(LifecycleManager::new(
        StoreConnectors::from_settings(settings),
        settings.timeouts.connect(),
    ))
}

async fn serve(settings: Arc<Settings>) -> Result<()> {
    let addr: SocketAddr = settings
        .server
        .addr
        .parse()
        .with_context(|| format!("Invalid server address '{}'", settings.server.addr))?;

    info!(
        environment = %settings.app.environment,
        log_level = %settings.app.log_level,
        "Starting graphrag-api"
    );
    if settings.config_endpoint_enabled() {
        warn!("GET /config is enabled and will expose credentials");
    }

    // Stores come up before the listener so no request sees a half-started service
    let lifecycle = build_lifecycle(&settings);
    lifecycle.start().await;

    let health = HealthAggregator::new(Arc::clone(&lifecycle), &settings);
    let app = create_app(Arc::new(AppState::new(Arc::clone(&settings), health)));

    let cancel_token = CancellationToken::new();
    tokio::spawn(watch_signals(cancel_token.clone()));

    let served = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!(address = %addr, "graphrag-api listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    cancel_token.cancelled().await;
                    info!("Received shutdown signal, draining connections");
                })
                .await
                .context("HTTP server error")
        }
        Err(e) => Err(e).with_context(|| format!("Failed to bind {addr}")),
    };

    lifecycle.stop().await;
    info!("graphrag-api shutdown complete");
    served
}

async fn check(settings: Arc<Settings>) -> Result<()> {
    let lifecycle = build_lifecycle(&settings);
    lifecycle.start().await;

    let report = HealthAggregator::new(Arc::clone(&lifecycle), &settings)
        .check_health()
        .await;
    lifecycle.stop().await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_healthy() {
        anyhow::bail!("one or more stores are unreachable");
    }
    Ok(())
}

/// Cancel `token` on Ctrl-C, or SIGTERM on Unix.
async fn watch_signals(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, initiating shutdown..."),
        () = terminate => info!("Received SIGTERM, initiating shutdown..."),
    }
    token.cancel();
}
