//! Live notification stream tests over real WebSocket connections.

mod common;

use common::{assert_no_event, next_event, wait_for, TestServer};
use std::time::Duration;

#[tokio::test]
async fn test_two_streams_then_one_disconnects() {
    let server = TestServer::start().await;
    let mut s1 = server.connect_stream().await;
    let mut s2 = server.connect_stream().await;
    assert_eq!(server.subscriber_count(), 2);

    let (status, _) = server.post_note("api", "auth", "p1", "first note").await;
    assert_eq!(status, 200);

    for ws in [&mut s1, &mut s2] {
        let event = next_event(ws).await;
        assert_eq!(event["event"], "POINT");
        let data = event["data"].as_str().unwrap();
        assert!(data.starts_with("notes,subsystem=auth,system=api "), "{data}");
        assert!(data.contains(r#"title="p1""#), "{data}");
    }

    s1.close(None).await.unwrap();
    assert!(
        wait_for(Duration::from_secs(2), || server.subscriber_count() == 1).await,
        "closed stream was not unregistered"
    );

    let (status, _) = server.get("/query?q=SELECT%201").await;
    assert_eq!(status, 200);

    let event = next_event(&mut s2).await;
    assert_eq!(event, serde_json::json!({"event": "QUERY", "data": "SELECT 1"}));

    server.shutdown().await;
}

#[tokio::test]
async fn test_abrupt_disconnect_is_reclaimed() {
    let server = TestServer::start().await;
    let ws = server.connect_stream().await;
    assert_eq!(server.subscriber_count(), 1);

    // Drop the socket without a close handshake.
    drop(ws);

    assert!(
        wait_for(Duration::from_secs(2), || server.subscriber_count() == 0).await,
        "dropped stream was not unregistered"
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_events_arrive_in_publish_order() {
    let server = TestServer::start().await;
    let mut ws = server.connect_stream().await;

    for i in 0..5 {
        let (status, _) = server.get(&format!("/query?q=SELECT%20{i}")).await;
        assert_eq!(status, 200);
    }

    for i in 0..5 {
        let event = next_event(&mut ws).await;
        assert_eq!(event["data"], format!("SELECT {i}"));
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_failed_write_is_not_streamed() {
    let server = TestServer::start().await;
    let mut ws = server.connect_stream().await;

    server.memory.fail_with(Some("database unavailable"));
    let (status, body) = server.post_note("api", "auth", "t", "lost").await;
    assert_eq!(status, 500);
    assert!(body.contains("database unavailable"), "{body}");

    assert_no_event(&mut ws, Duration::from_millis(100)).await;

    server.memory.fail_with(None);
    let (status, _) = server.post_note("api", "auth", "t", "kept").await;
    assert_eq!(status, 200);
    let event = next_event(&mut ws).await;
    assert!(event["data"].as_str().unwrap().contains(r#"text="kept""#));

    server.shutdown().await;
}

#[tokio::test]
async fn test_stalled_stream_drops_excess() {
    let capacity = 4;
    let server = TestServer::start_with_capacity(capacity).await;

    // Subscribe directly so nothing drains the queue while we publish.
    let (mut queue, _subscription) = server.state.store.registry().subscribe();
    for i in 0..capacity + 5 {
        let (status, _) = server.get(&format!("/query?q=SELECT%20{i}")).await;
        assert_eq!(status, 200, "publisher must not see drops");
    }

    let held: Vec<String> = std::iter::from_fn(|| queue.try_receive())
        .map(|n| n.payload().to_string())
        .collect();
    let expected: Vec<String> = (0..capacity).map(|i| format!("SELECT {i}")).collect();
    assert_eq!(held, expected);

    server.shutdown().await;
}

#[tokio::test]
async fn test_plain_get_on_stream_is_rejected() {
    let server = TestServer::start().await;

    let (status, _) = server.get("/stream").await;
    assert!(status.is_client_error(), "got {status}");
    assert_eq!(server.subscriber_count(), 0);

    server.shutdown().await;
}
