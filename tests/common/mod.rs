//! Test utilities and server harness for anflux tests.
//!
//! Provides:
//! - In-process test server backed by a memory store
//! - HTTP and WebSocket client helpers

#![allow(dead_code)]

use anflux::config::Config;
use anflux::server::{router, serve, ServerState};
use anflux::storage::MemoryStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// In-process server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<ServerState>,
    pub memory: Arc<MemoryStore>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_capacity(Config::test_config().stream_queue_capacity).await
    }

    pub async fn start_with_capacity(queue_capacity: usize) -> Self {
        anflux::observability::tracing::init_test_tracing();

        let memory = Arc::new(MemoryStore::new());
        let state = Arc::new(ServerState::new(memory.clone(), queue_capacity));
        state.store.initialize().await.expect("initialize failed");

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
        let addr = listener.local_addr().expect("no local addr");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            serve(listener, server_state, shutdown_rx)
                .await
                .expect("server failed");
        });

        Self {
            addr,
            state,
            memory,
            shutdown_tx,
            handle,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.store.registry().subscriber_count()
    }

    /// Open a WebSocket to `/stream` and wait until it is registered.
    pub async fn connect_stream(&self) -> WsClient {
        let before = self.subscriber_count();
        let (ws, _) = connect_async(format!("ws://{}/stream", self.addr))
            .await
            .expect("websocket connect failed");
        assert!(
            wait_for(Duration::from_secs(2), || self.subscriber_count() > before).await,
            "stream was not registered"
        );
        ws
    }

    /// Send a request through the router sharing this server's state.
    pub async fn request(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = router(self.state.clone())
            .oneshot(request)
            .await
            .expect("request failed");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body read failed");
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    pub async fn post_note(
        &self,
        system: &str,
        subsystem: &str,
        title: &str,
        text: &str,
    ) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/note/{system}/{subsystem}?title={title}"))
            .body(Body::from(text.to_string()))
            .expect("invalid request");
        self.request(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("invalid request");
        self.request(request).await
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Next text frame from the stream, parsed as JSON.
pub async fn next_event(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("event is not JSON");
        }
    }
}

/// Assert no text frame arrives within `wait`.
pub async fn assert_no_event(ws: &mut WsClient, wait: Duration) {
    if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(wait, ws.next()).await {
        panic!("unexpected event: {text}");
    }
}

/// Wait for a condition to become true with timeout.
///
/// # Returns
///
/// `true` if condition was met, `false` if timeout expired
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
