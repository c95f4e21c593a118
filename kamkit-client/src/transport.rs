//! HTTP transport for control-API calls
//!
//! [`HttpTransport`] owns two `reqwest` clients:
//!
//! - a **regular** client for calls to the configured control endpoint,
//!   with the optional call deadline from [`ClientConfig::timeout`];
//! - an **insecure** client that skips TLS certificate verification and
//!   always applies [`ClientConfig::peer_timeout`]. It is meant for health
//!   checks against peers with self-signed certificates, where a slow or
//!   unreachable peer must not hold up the caller.
//!
//! Each method performs exactly one HTTP exchange. There are no retries and
//! no backoff. The response body is returned whatever the HTTP status; the
//! caller's validator decides what it means. Both clients pool connections
//! internally and are safe to share across tasks.

use crate::config::ClientConfig;
use kamkit_core::{Error, Result};
use reqwest::{header, Client, RequestBuilder};

/// Pair of HTTP clients used for control and peer calls
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    insecure: Client,
}

impl HttpTransport {
    /// Build both clients from the configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        let insecure = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(config.peer_timeout)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build peer HTTP client: {}", e)))?;

        Ok(Self { client, insecure })
    }

    /// POST a JSON document and return the response body
    pub async fn post(&self, url: &str, body: String) -> Result<String> {
        send(json_post(&self.client, url, body)).await
    }

    /// GET a URL and return the response body
    pub async fn get(&self, url: &str) -> Result<String> {
        send(self.client.get(url)).await
    }

    /// POST without certificate checks, bounded by the peer deadline
    pub async fn post_insecure(&self, url: &str, body: String) -> Result<String> {
        send(json_post(&self.insecure, url, body)).await
    }

    /// GET without certificate checks, bounded by the peer deadline
    pub async fn get_insecure(&self, url: &str) -> Result<String> {
        send(self.insecure.get(url)).await
    }
}

fn json_post(client: &Client, url: &str, body: String) -> RequestBuilder {
    client
        .post(url)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
}

async fn send(request: RequestBuilder) -> Result<String> {
    let response = request.send().await.map_err(classify_error)?;
    tracing::trace!(status = %response.status(), "HTTP response received");
    response.text().await.map_err(classify_error)
}

/// Map a reqwest failure onto the kamkit taxonomy
fn classify_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout
    } else if error.is_builder() {
        Error::Transport(format!("invalid request: {}", error))
    } else if error.is_connect() {
        Error::Transport(format!("connection failed: {}", error))
    } else {
        Error::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transport_builds_with_and_without_timeout() {
        let plain = ClientConfig::new("http://127.0.0.1:1/RPC");
        assert!(HttpTransport::new(&plain).is_ok());

        let bounded = plain.with_timeout(Duration::from_secs(1));
        assert!(HttpTransport::new(&bounded).is_ok());
    }

    #[tokio::test]
    async fn test_malformed_url_is_transport_error() {
        let transport = HttpTransport::new(&ClientConfig::new("unused")).unwrap();
        let result = transport.post("not a url", "{}".to_string()).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let transport = HttpTransport::new(&ClientConfig::new("unused")).unwrap();
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = transport.get(&format!("http://127.0.0.1:{}/", port)).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
