//! Identity Resolver (idlk-ir) - Main entry point
//!
//! Serves `POST /identify` over a SQLite contact store.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use idlk_common::config::{self, TomlConfig, DATABASE_ENV_VAR};
use idlk_common::db::init_database;
use idlk_ir::db::ContactStore;
use idlk_ir::resolver::IdentityResolver;
use idlk_ir::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for idlk-ir
#[derive(Parser, Debug)]
#[command(name = "idlk-ir")]
#[command(about = "Identity resolution service for contact fingerprints")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "IDLK_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides IDLK_DATABASE and the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "IDLK_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    // Loaded before logging exists; the outcome is reported once the subscriber is up
    let toml_config = TomlConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", toml_config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting idlk Identity Resolver (idlk-ir) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        idlk_ir::GIT_HASH,
        idlk_ir::BUILD_TIMESTAMP,
        idlk_ir::BUILD_PROFILE
    );

    if config_path.exists() {
        info!("Loaded configuration from {}", config_path.display());
    } else {
        warn!(
            "Config file not found at {}, using compiled defaults",
            config_path.display()
        );
    }

    let db_path =
        config::resolve_database_path(args.database.as_deref(), DATABASE_ENV_VAR, &toml_config);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path, &toml_config.database)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let resolver = IdentityResolver::new(ContactStore::new(pool.clone()), &toml_config.resolver);
    info!(
        novelty = ?toml_config.resolver.novelty,
        max_attempts = toml_config.resolver.max_attempts,
        "Identity resolver initialized"
    );

    let app = build_router(AppState::new(resolver));

    let bind = args.bind.unwrap_or(toml_config.bind_address);
    let port = args.port.unwrap_or(toml_config.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("idlk-ir listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
