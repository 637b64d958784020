//! ponto-api - HTTP admin API for encoding repair

use std::net::SocketAddr;

use tracing::info;

use ponto_core::logging::subsystems;
use ponto_core::{defaults, EncodingConfig};
use ponto_db::{Database, PoolConfig};

use ponto_api::logging::{init_tracing, LogSettings};
use ponto_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _file_guard = init_tracing(&LogSettings::from_env());

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DATABASE_URL.to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| defaults::SERVER_HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(defaults::SERVER_PORT);
    let max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|n| n.parse().ok())
        .unwrap_or(defaults::DB_MAX_CONNECTIONS);

    let config = EncodingConfig::from_env()?;
    info!(
        subsystem = subsystems::CONFIG,
        tables = config.tables.len(),
        "Encoding table configuration ready"
    );

    let db = Database::connect_with_config(
        &database_url,
        PoolConfig::default().max_connections(max_connections),
    )
    .await?;

    let app = router(AppState::new(db, config));

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
