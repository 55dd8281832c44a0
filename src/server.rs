//! HTTP server setup and lifecycle.
//!
//! Configures the axum router with:
//! - Note ingestion and query handlers
//! - The live WebSocket notification stream and its watch page
//! - Request tracing and graceful shutdown

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::flow::NotificationRegistry;
use crate::service::{handle_health, note, query, stream, watch as watch_page};
use crate::storage::{InfluxStore, ObservedStore, TimeSeriesStore};

/// Server state shared across handlers.
pub struct ServerState {
    pub store: ObservedStore,
}

impl ServerState {
    /// State over `store` with a fresh registry of the given queue capacity.
    pub fn new(store: Arc<dyn TimeSeriesStore>, queue_capacity: usize) -> Self {
        Self {
            store: ObservedStore::new(store, NotificationRegistry::new(queue_capacity)),
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/note/:system/:subsystem", post(note::handle_post_note))
        .route("/query", get(query::handle_query))
        .route("/stream", get(stream::handle_stream))
        .route("/watch", get(watch_page::handle_watch))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `state` on an already bound listener until shutdown is signalled.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ServerState>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("Shutdown signal received, stopping server");
        })
        .await?;
    Ok(())
}

/// Run the anflux server against InfluxDB.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `shutdown_rx` - Receiver for shutdown signal
///
/// # Returns
///
/// Returns when the server has shut down, or early if the database cannot
/// be initialized.
pub async fn run_server(
    config: Config,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = config.bind_addr().parse()?;

    let influx = config.influx();
    tracing::info!(host = %influx.host, database = %influx.database, "Creating InfluxDB client");
    let store = InfluxStore::new(influx)?;

    let state = Arc::new(ServerState::new(Arc::new(store), config.stream_queue_capacity));
    state.store.initialize().await?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Starting anflux HTTP server");

    serve(listener, state, shutdown_rx).await?;

    tracing::info!("Server stopped");
    Ok(())
}
