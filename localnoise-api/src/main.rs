//! localnoise-api - LocalNoise backend service
//!
//! Serves the band map's REST API: band CRUD with marker placement,
//! account auth, and the external catalog surfaces.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use localnoise_api::{build_router, AppState};
use localnoise_common::config::{Config, ConfigOverrides};
use localnoise_common::db::init_database;

#[derive(Debug, Parser)]
#[command(name = "localnoise-api", about = "LocalNoise band map backend")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Override the SQLite database path
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before any slow startup work
    info!(
        "Starting LocalNoise API v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let overrides = ConfigOverrides {
        config_path: cli.config,
        port: cli.port,
        database_path: cli.database,
    };
    let config = Config::load(&overrides)?;

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path).await?;

    let bind_addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(pool, config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("localnoise-api listening on http://{}", bind_addr);
    info!("Health check: http://{}/api/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
