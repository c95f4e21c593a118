//! Peer health-check integration tests

mod common;

use common::MockRpcServer;
use kamkit_client::{ClientBuilder, KamailioClient};
use kamkit_core::Error;
use std::time::Duration;

#[tokio::test]
async fn test_peer_status_returns_body() {
    let server = MockRpcServer::respond_with("OK").await;
    let client = KamailioClient::new("http://127.0.0.1:1/RPC").unwrap();

    let status = client.peer_status(&server.url()).await.unwrap();
    assert_eq!(status, "OK");

    server.shutdown();
}

#[tokio::test]
async fn test_slow_peer_times_out() {
    let server = MockRpcServer::with_handler(|_request| async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        "OK".to_string()
    })
    .await;
    let client = ClientBuilder::new("http://127.0.0.1:1/RPC")
        .peer_timeout(Duration::from_millis(300))
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    let result = client.peer_status(&server.url()).await;

    assert!(matches!(result, Err(Error::Timeout)));
    assert!(started.elapsed() < Duration::from_secs(3));

    server.shutdown();
}

#[tokio::test]
async fn test_unreachable_peer_is_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = KamailioClient::new("http://127.0.0.1:1/RPC").unwrap();

    let result = client.peer_status(&format!("http://127.0.0.1:{}/", port)).await;
    assert!(matches!(result, Err(Error::Transport(_))));
}

#[tokio::test]
async fn test_peer_call_posts_request_to_peer() {
    let mut server =
        MockRpcServer::respond_with(common::mock_response(serde_json::json!("ok"))).await;
    let client = KamailioClient::new("http://127.0.0.1:1/RPC").unwrap();

    let mut params = serde_json::Map::new();
    params.insert("htable".to_string(), serde_json::json!("ipban"));
    let body = client.peer_call(&server.url(), "htable.flush", params).await.unwrap();
    assert!(body.contains("\"ok\""));

    let request = server.next_request().await.unwrap();
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "htable.flush");
    assert_eq!(request["params"]["htable"], "ipban");

    server.shutdown();
}

#[tokio::test]
async fn test_peer_call_reports_remote_error() {
    let server = MockRpcServer::respond_with(common::mock_error_response(500, "busy")).await;
    let client = KamailioClient::new("http://127.0.0.1:1/RPC").unwrap();

    let result = client
        .peer_call(&server.url(), "core.uptime", serde_json::Map::new())
        .await;
    assert!(matches!(result, Err(Error::Remote { ref message, .. }) if message == "busy"));

    server.shutdown();
}

#[tokio::test]
async fn test_fetch_returns_body_unvalidated() {
    let server = MockRpcServer::respond_with("not json at all").await;
    let client = KamailioClient::new("http://127.0.0.1:1/RPC").unwrap();

    let body = client.fetch(&server.url()).await.unwrap();
    assert_eq!(body, "not json at all");

    server.shutdown();
}
