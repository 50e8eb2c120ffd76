//! Depot Gateway - serves stored files over HTTP behind the access gate.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use http::header::{ACCEPT, ORIGIN};
use http::Method;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use gateway::{Config, ServiceState};

/// Depot Gateway - serves stored files over HTTP behind the access gate
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on for HTTP requests
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Path to the object storage directory
    #[arg(short, long)]
    objects: Option<PathBuf>,

    /// Public base URL used in grant and action links
    #[arg(long)]
    public_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stdout_layer).init();

    tracing::info!("Starting Depot Gateway");

    // Create configuration
    let mut config = Config::default();
    config.listen_addr = SocketAddr::from_str(&format!("0.0.0.0:{}", args.port))?;
    config.log_level = log_level;

    if let Some(db_path) = args.database {
        config.sqlite_path = Some(db_path);
    }

    if let Some(objects_path) = args.objects {
        config.objects_path = Some(objects_path);
    }

    if let Some(public_url) = args.public_url {
        config.public_url = public_url
            .parse()
            .context("invalid --public-url")?;
    }

    // Create state
    let state = match ServiceState::from_config(&config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create service state: {}", e);
            std::process::exit(1);
        }
    };

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let graceful_shutdown = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl+c");
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    };
    tokio::spawn(graceful_shutdown);

    // Build router
    let router = build_router(state);

    tracing::info!("Gateway listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    let mut server_rx = shutdown_rx.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = server_rx.changed().await;
        })
        .await?;

    tracing::info!("Gateway shutdown complete");
    Ok(())
}

/// Build the gateway router with the retrieval route and middleware layers
fn build_router(state: ServiceState) -> axum::Router {
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET])
        .allow_headers(vec![ACCEPT, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false);

    let trace_layer = TraceLayer::new_for_http();

    gateway::http::router(state).layer(cors_layer).layer(trace_layer)
}
