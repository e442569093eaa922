use clap::Parser;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use subscription_backend::db::services::PgSubscriptionStore;
use subscription_backend::server::config::ServerConfig;
use subscription_backend::server::logging::init_logging;
use subscription_backend::web::create_axum_router;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Keep the plain version output without touching config or logging.
    if std::env::args().any(|arg| arg == "--version") {
        println!("Server version: {VERSION}");
        return Ok(());
    }

    let args = Args::parse();

    // --- Server Config Setup ---
    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir, server_config.is_dev());
    info!(version = VERSION, env = %server_config.env, "Starting server.");

    // --- Database Pool Setup ---
    let mut opt = ConnectOptions::new(server_config.database_url());
    opt.max_connections(server_config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db_pool: DatabaseConnection = match Database::connect(opt).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to create database connection.");
            return Err(e.into());
        }
    };
    if let Err(e) = db_pool.ping().await {
        error!(error = %e, "Database did not answer ping.");
        return Err(e.into());
    }
    info!(
        host = %server_config.postgres_host,
        database = %server_config.postgres_db,
        "Connected to database."
    );

    // --- Axum HTTP Server Setup ---
    let store = Arc::new(PgSubscriptionStore::new(db_pool));
    let app = create_axum_router(store.clone());

    let addr = server_config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Box::new)?;

    match Arc::try_unwrap(store) {
        Ok(store) => store.into_inner().close().await?,
        Err(_) => warn!("Store still referenced after shutdown; leaving the pool to drop."),
    }
    Ok(())
}
