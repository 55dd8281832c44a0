//! Live notification stream over WebSocket (`GET /stream`).
//!
//! A failed handshake is rejected by the upgrade extractor before any
//! subscriber queue exists, so there is nothing to clean up on that path.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{future, SinkExt, StreamExt};
use std::sync::Arc;

use crate::server::ServerState;
use crate::session::StreamSession;

/// Handle GET /stream.
pub async fn handle_stream(
    State(state): State<Arc<ServerState>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| run_stream(state, socket))
}

async fn run_stream(state: Arc<ServerState>, socket: WebSocket) {
    let (sink, inbound) = socket.split();
    let peer = sink.with(|frame: String| future::ready(Ok::<_, axum::Error>(Message::Text(frame))));

    let session = StreamSession::open(state.store.registry(), peer, inbound);
    session.run().await;
}
