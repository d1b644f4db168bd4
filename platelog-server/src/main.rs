//! platelog-server - HTTP API for the platelog analytics backend.

use anyhow::{Context, Result};
use clap::Parser;
use platelog_core::analytics::PlaceholderReference;
use platelog_core::{Config, Database};
use platelog_server::{create_router, AppState};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "platelog-server", about = "Nutrition analytics API server", version)]
struct Args {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen address from the configuration
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port from the configuration
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Initialize logging
    let _log_guard =
        platelog_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("platelog-server starting up");

    // Open database
    let db_path = config.database.resolve_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let state = AppState::new(db, PlaceholderReference);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
