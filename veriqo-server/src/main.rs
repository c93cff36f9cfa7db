//! Veriqo Server - REST API for reverse image search
//!
//! Exposes veriqo-core matching via HTTP endpoints:
//! - POST /api/search/upload - Search for an uploaded image
//! - GET  /api/search/recent - List recent searches
//! - GET  /test              - Document store diagnostics

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};
use veriqo_server::{
    create_router, AppState, Config, MemorySearchStore, MongoSearchStore, SearchStore,
    StoreBackend,
};

/// Default log filter when RUST_LOG is unset
const DEFAULT_LOG_FILTER: &str = "veriqo_server=info,veriqo_core=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .init();

    let config = Config::from_env();
    tracing::debug!(?config, "Configuration loaded");

    let store = build_store(&config).await;
    let addr = config.socket_addr();
    let app = create_router(AppState::new(config, store));

    tracing::info!("Veriqo server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Pick the search store. Startup never fails on the store: without one,
/// searches still succeed and report the missing database per request.
async fn build_store(config: &Config) -> Option<Arc<dyn SearchStore>> {
    if config.store_backend == StoreBackend::Memory {
        tracing::warn!("Search store: in-memory (records are lost on restart)");
        return Some(Arc::new(MemorySearchStore::new()));
    }

    let (Some(url), Some(name)) = (&config.database_url, &config.database_name) else {
        tracing::warn!("Search store: DATABASE_URL or DATABASE_NAME not set, persistence disabled");
        return None;
    };

    match MongoSearchStore::connect(url, name, config.store_timeout()).await {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            tracing::error!(error = %e, "Search store: MongoDB setup failed, persistence disabled");
            None
        }
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
