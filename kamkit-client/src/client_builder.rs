//! Client builder for deadlines and observability
//!
//! The `ClientBuilder` provides a fluent API for configuring a
//! [`KamailioClient`] before use. It allows you to:
//! - Set the call and peer-check deadlines
//! - Inject a custom [`RpcObserver`]
//! - Configure observability (OpenTelemetry) and the service name
//!
//! # Examples
//!
//! ```rust,no_run
//! use kamkit_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # fn example() -> kamkit_core::Result<()> {
//! let client = ClientBuilder::new("http://127.0.0.1:5060/RPC")
//!     .timeout(Duration::from_secs(5))
//!     .peer_timeout(Duration::from_secs(1))
//!     .build()?;
//!
//! // With observability
//! let client2 = ClientBuilder::new("http://127.0.0.1:5060/RPC")
//!     .with_default_observability()
//!     .service_name("kam-admin")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::metrics::{ClientMetrics, MetricsObserver};
use crate::{ClientConfig, KamailioClient};
use kamkit_core::{Error, ObservabilityConfig, Result, RpcObserver, TracingObserver};
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating a KamailioClient
pub struct ClientBuilder {
    config: ClientConfig,
    observer: Option<Arc<dyn RpcObserver>>,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new(url: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(url))
    }

    /// Start from an existing configuration, e.g. [`ClientConfig::from_env`]
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            observer: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Deadline for regular control calls
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Deadline for insecure peer checks
    pub fn peer_timeout(mut self, timeout: Duration) -> Self {
        self.config.peer_timeout = timeout;
        self
    }

    /// Use a custom observer instead of the default
    pub fn observer(mut self, observer: Arc<dyn RpcObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the client
    ///
    /// With observability enabled and no explicit observer, calls are
    /// recorded through a [`MetricsObserver`].
    pub fn build(self) -> Result<KamailioClient> {
        let metrics_observer = if let Some(mut config) = self.observability_config {
            // Override service name if provided
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            kamkit_core::init_observability(config.clone())
                .map_err(|e| Error::Config(format!("Failed to initialize observability: {}", e)))?;

            let metrics = ClientMetrics::new(config.service_name);
            Some(Arc::new(MetricsObserver::new(metrics)) as Arc<dyn RpcObserver>)
        } else {
            None
        };

        let observer = self
            .observer
            .or(metrics_observer)
            .unwrap_or_else(|| Arc::new(TracingObserver));

        tracing::debug!(url = %self.config.url, "Building control client");
        KamailioClient::with_config(self.config, observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kamkit_core::NoopObserver;

    #[test]
    fn test_builder_creation() {
        let builder = ClientBuilder::new("http://127.0.0.1:5060/RPC");
        assert_eq!(builder.config.url, "http://127.0.0.1:5060/RPC");
        assert!(builder.config.timeout.is_none());
        assert!(builder.observer.is_none());
        assert!(builder.observability_config.is_none());
    }

    #[test]
    fn test_builder_deadlines() {
        let builder = ClientBuilder::new("http://kam/RPC")
            .timeout(Duration::from_secs(5))
            .peer_timeout(Duration::from_millis(250));
        assert_eq!(builder.config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(builder.config.peer_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_builder_with_observability() {
        let builder = ClientBuilder::new("http://kam/RPC")
            .with_default_observability()
            .service_name("test-service");
        assert!(builder.observability_config.is_some());
        assert_eq!(builder.service_name, Some("test-service".to_string()));
    }

    #[test]
    fn test_build_with_custom_observer() {
        let client = ClientBuilder::new("http://kam/RPC")
            .observer(Arc::new(NoopObserver))
            .build()
            .unwrap();
        assert_eq!(client.url(), "http://kam/RPC");
    }

    #[test]
    fn test_build_two_observed_clients() {
        let first = ClientBuilder::new("http://kam-a/RPC")
            .with_default_observability()
            .service_name("kam-a")
            .build();
        let second = ClientBuilder::new("http://kam-b/RPC")
            .with_default_observability()
            .service_name("kam-b")
            .build();

        assert_eq!(first.unwrap().url(), "http://kam-a/RPC");
        assert_eq!(second.unwrap().url(), "http://kam-b/RPC");
    }

    #[test]
    fn test_build_from_config() {
        let config = ClientConfig::new("http://kam/RPC").with_timeout(Duration::from_secs(3));
        let client = ClientBuilder::from_config(config).build().unwrap();
        assert_eq!(client.config.timeout, Some(Duration::from_secs(3)));
    }
}
