//! Bilingual restaurant menu service.
//!
//! Serves the public carta (one aggregated, sorted, locale-resolved view per
//! category tab) and the admin editor API behind it. Documents live in an
//! external store: Redis in production, an in-memory store seeded from a
//! static JSON document for fallback deployments and tests.

use std::sync::Arc;

use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod form;
pub mod menu;
pub mod migrate;
pub mod model;
pub mod price;
pub mod render;
pub mod routes;
pub mod state;
pub mod store;
pub mod text;

use config::Config;
use state::State;
use store::{DocumentStore, MemoryStore, RedisStore};

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading configuration...");
    let config = Config::load();

    let store: Arc<dyn DocumentStore> = match &config.menu_json {
        Some(path) => {
            info!("Serving static menu document from {path}");
            let raw = std::fs::read_to_string(path).expect("Static menu misconfigured!");
            let doc = serde_json::from_str(&raw).expect("Static menu misconfigured!");
            Arc::new(MemoryStore::from_json(&doc).expect("Static menu misconfigured!"))
        }
        None => {
            info!("Connecting to Redis...");
            let store = RedisStore::connect(&config.redis_url)
                .await
                .expect("Redis misconfigured!");
            Arc::new(store)
        }
    };

    let state = State::new(config, store);

    info!("Starting server...");
    let app = routes::router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .expect("Failed to bind address!");
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server crashed!");

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
