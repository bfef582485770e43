//! Amigo Server
//!
//! Secret friend draw: participants enroll by name, receive a friend to give a
//! gift to and an access token to look the friend up again later.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use amigo_core::services::{DrawService, RegisterParticipant};
use amigo_core::store::PgPoolStore;
use clap::Parser;
use config::file::ParticipantConfig;
use config::{ConfigLoader, get_database_url};
use kanau::processor::Processor;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Amigo - secret friend draw server
#[derive(Parser, Debug)]
#[command(name = "amigo-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./amigo-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting amigo-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!(
        strategy = %loaded_config.draw.strategy,
        participants = loaded_config.participants.len(),
        "Configuration loaded from {:?}",
        args.config
    );

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(loaded_config.database.max_connections)
        .acquire_timeout(loaded_config.database.operation_timeout)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let store = PgPoolStore::new(db_pool.clone(), loaded_config.database.operation_timeout);
    let draw = Arc::new(DrawService::new(Arc::new(store), loaded_config.draw));

    seed_participants(&draw, &loaded_config.participants).await?;

    // Create application state
    let state = AppState::new(draw, loaded_config.shared());

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler to stop
    shutdown_notify.notify_one();

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Insert configured participants that are not in the pool yet.
async fn seed_participants(
    draw: &DrawService,
    participants: &[ParticipantConfig],
) -> anyhow::Result<()> {
    let mut added = 0usize;
    for participant in participants {
        let inserted = draw
            .process(RegisterParticipant {
                name: participant.name.clone(),
                interests: participant.interests.clone(),
            })
            .await
            .map_err(|e| {
                tracing::error!(name = %participant.name, "Failed to seed participant: {}", e);
                e
            })?;
        if inserted {
            added += 1;
        }
    }
    tracing::info!(added, configured = participants.len(), "Participants seeded");
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
