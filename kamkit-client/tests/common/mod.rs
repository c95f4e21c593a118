//! Common test utilities for kamkit-client integration tests
//!
//! This module provides a mock JSON-RPC HTTP endpoint so client behavior can
//! be tested without a running telephony server.

use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::{mpsc, oneshot};
use warp::Filter;

/// Mock JSON-RPC endpoint for client testing
///
/// Every request body is forwarded to the test through a channel and
/// answered by the handler.
pub struct MockRpcServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    body_rx: mpsc::Receiver<String>,
}

impl MockRpcServer {
    /// Start a server that answers every request with `body`
    pub async fn respond_with(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::with_handler(move |_request| {
            let body = body.clone();
            async move { body }
        })
        .await
    }

    /// Start a mock server with a custom handler
    ///
    /// The handler receives the raw request body and returns the raw
    /// response body.
    pub async fn with_handler<F, Fut>(handler: F) -> Self
    where
        F: Fn(String) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (body_tx, body_rx) = mpsc::channel::<String>(100);

        let route = warp::any()
            .and(warp::body::bytes())
            .then(move |raw: bytes::Bytes| {
                let handler = handler.clone();
                let body_tx = body_tx.clone();
                async move {
                    let request = String::from_utf8_lossy(&raw).to_string();
                    // Send to test channel for verification
                    let _ = body_tx.send(request.clone()).await;
                    let response = handler(request).await;
                    warp::reply::with_header(response, "content-type", "application/json")
                }
            });

        let (addr, server) = warp::serve(route)
            .bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                let _ = shutdown_rx.await;
            });
        tokio::spawn(server);

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            body_rx,
        }
    }

    /// URL of the JSON-RPC endpoint
    pub fn url(&self) -> String {
        format!("http://{}/RPC", self.addr)
    }

    /// Wait for the next request body received by the server
    ///
    /// Returns None if nothing arrives within five seconds.
    pub async fn next_request(&mut self) -> Option<serde_json::Value> {
        let raw = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.body_rx.recv())
            .await
            .ok()
            .flatten()?;
        serde_json::from_str(&raw).ok()
    }

    /// Shutdown the mock server
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Helper to create a mock JSON-RPC response
pub fn mock_response(result: serde_json::Value) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": "1673900000000000"
    })
    .to_string()
}

/// Helper to create a mock JSON-RPC error response
pub fn mock_error_response(code: i64, message: &str) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "error": {
            "code": code,
            "message": message
        },
        "id": "1673900000000000"
    })
    .to_string()
}
