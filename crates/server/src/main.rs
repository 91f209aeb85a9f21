//! Reparto delivery server binary.
//!
//! Serves the delivery-order tracking API:
//!
//! - Axum web framework over a JSON API
//! - `PostgreSQL` for durable order state
//! - Redis for the ephemeral driver position cache
//! - Nominatim-compatible geocoding for destination addresses

#![cfg_attr(not(test), forbid(unsafe_code))]

use reparto_server::{app, config::AppConfig, db, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "reparto_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p reparto-cli -- migrate

    let redis = db::connect_redis(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");
    tracing::info!("Redis connection established");

    let addr = config.socket_addr();
    let state = AppState::new(config, pool, redis).expect("Failed to initialize application state");

    let app = app(state);

    tracing::info!("server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
