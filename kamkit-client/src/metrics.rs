//! Client metrics definitions
//!
//! OpenTelemetry instruments for control-API traffic. They are exported to
//! whatever meter provider [`kamkit_core::init_observability`] installed; with
//! no provider the global no-op meter swallows them.
//!
//! # Metrics Collected
//!
//! - **kamkit.client.requests.total**: calls made, by method and status (counter)
//! - **kamkit.client.request.duration**: call latency in seconds (histogram)
//! - **kamkit.client.errors.total**: failed calls, by error kind (counter)
//! - **kamkit.client.peer.timeouts**: peer checks that hit the deadline (counter)
//!
//! [`MetricsObserver`] feeds these from the client's observer hooks and is
//! installed by `ClientBuilder::with_observability()`.

use kamkit_core::{Error, RpcObserver, TracingObserver};
use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use std::time::Duration;

/// Method label used for insecure peer checks
pub const PEER_STATUS_METHOD: &str = "peer.status";

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Total number of calls made
    pub requests_total: Counter<u64>,
    /// Call duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of failed calls
    pub errors_total: Counter<u64>,
    /// Peer checks that ran out of time
    pub peer_timeouts: Counter<u64>,
}

impl ClientMetrics {
    /// Create a new ClientMetrics instance
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create a new ClientMetrics instance with a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("kamkit.client.requests.total")
                .with_description("Total number of control-API calls")
                .build(),
            request_duration: meter
                .f64_histogram("kamkit.client.request.duration")
                .with_description("Control-API call duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("kamkit.client.errors.total")
                .with_description("Total number of failed control-API calls")
                .build(),
            peer_timeouts: meter
                .u64_counter("kamkit.client.peer.timeouts")
                .with_description("Peer health checks that exceeded their deadline")
                .build(),
        }
    }

    /// Record a finished call
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &str) {
        let attributes = &[KeyValue::new("error_type", error_type.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record a peer check timeout
    pub fn record_peer_timeout(&self) {
        self.peer_timeouts.add(1, &[]);
    }
}

/// Short label for an error, used as the `error_type` attribute
pub fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::Transport(_) => "transport",
        Error::Timeout => "timeout",
        Error::InvalidResponse(_) => "invalid_response",
        Error::Remote { .. } => "remote",
        Error::Format(_) => "format",
        Error::Serialization(_) => "serialization",
        _ => "other",
    }
}

/// Observer that records metrics and then logs through [`TracingObserver`]
pub struct MetricsObserver {
    metrics: ClientMetrics,
    log: TracingObserver,
}

impl MetricsObserver {
    pub fn new(metrics: ClientMetrics) -> Self {
        Self {
            metrics,
            log: TracingObserver,
        }
    }
}

impl RpcObserver for MetricsObserver {
    fn on_request(&self, method: &str, url: &str) {
        self.log.on_request(method, url);
    }

    fn on_response(&self, method: &str, elapsed: Duration) {
        self.metrics
            .record_request(method, "success", elapsed.as_secs_f64());
        self.log.on_response(method, elapsed);
    }

    fn on_error(&self, method: &str, error: &Error, elapsed: Duration) {
        self.metrics
            .record_request(method, "error", elapsed.as_secs_f64());
        self.metrics.record_error(error_kind(error));
        if method == PEER_STATUS_METHOD && error.is_timeout() {
            self.metrics.record_peer_timeout();
        }
        self.log.on_error(method, error, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientMetrics::new("test-client");

        // Just test that metrics can be created without panicking
        metrics.record_request("core.uptime", "success", 0.05);
        metrics.record_error("timeout");
        metrics.record_peer_timeout();
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(error_kind(&Error::Timeout), "timeout");
        assert_eq!(error_kind(&Error::remote("busy", Some(500))), "remote");
        assert_eq!(error_kind(&Error::InvalidResponse("x".into())), "invalid_response");
        assert_eq!(error_kind(&Error::NoCookie), "other");
    }

    #[test]
    fn test_observer_hooks() {
        let observer = MetricsObserver::new(ClientMetrics::new("test-client-observer"));

        observer.on_request("htable.dump", "http://127.0.0.1/RPC");
        observer.on_response("htable.dump", Duration::from_millis(12));
        observer.on_error("ul.dump", &Error::remote("busy", None), Duration::from_millis(3));
        observer.on_error(PEER_STATUS_METHOD, &Error::Timeout, Duration::from_secs(2));
    }
}
