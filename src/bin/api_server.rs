// API Server Binary Entry Point
//
// Usage: cargo run --features api --bin api_server

use soil_health_advisor::{create_router, AppState, ServerConfig};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "soil_health_advisor=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Soil Health Advisor...");

    // Configuration from environment variables
    let config = ServerConfig::from_env();

    tracing::info!("Configuration:");
    tracing::info!("  MODELS_DIR: {:?}", config.models_dir);
    tracing::info!("  STATIC_DIR: {:?}", config.static_dir);
    tracing::info!("  MAX_UPLOAD_BYTES: {}", config.max_upload_bytes);
    tracing::info!("  DISEASE_DB: {:?}", config.disease_db);
    tracing::info!("  PORT: {}", config.port);

    let port = config.port;

    // Load models, calibration and knowledge base
    let state = AppState::new(config)?;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await?;

    Ok(())
}
