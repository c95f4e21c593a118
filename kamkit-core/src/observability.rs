//! Logging, tracing and per-call observation hooks
//!
//! Two layers live here:
//!
//! - **Process setup**: [`ObservabilityConfig`] and [`init_observability`]
//!   install a `tracing` subscriber (env filter + JSON formatter) and, when
//!   enabled, OTLP exporters for traces and metrics.
//! - **Per-call hooks**: [`RpcObserver`] is injected into the client and is
//!   told about every request, response and failure. The default
//!   [`TracingObserver`] turns those into `tracing` events; applications can
//!   supply their own, or [`NoopObserver`] to stay silent.
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: collector endpoint
//! - `RUST_LOG`: log level filter (e.g. "info", "kamkit_client=debug")

use crate::error::Error;
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{SdkTracerProvider, Tracer};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Receives one callback per control-API call phase
///
/// All methods default to doing nothing so implementors only override what
/// they need. Implementations must be cheap: they run inline on the caller's
/// task.
pub trait RpcObserver: Send + Sync {
    /// A request is about to be sent
    fn on_request(&self, _method: &str, _url: &str) {}

    /// A response arrived and passed validation
    fn on_response(&self, _method: &str, _elapsed: Duration) {}

    /// The call failed at any stage
    fn on_error(&self, _method: &str, _error: &Error, _elapsed: Duration) {}
}

/// Observer that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RpcObserver for NoopObserver {}

/// Observer that reports calls as `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RpcObserver for TracingObserver {
    fn on_request(&self, method: &str, url: &str) {
        tracing::debug!(method = %method, url = %url, "Sending control request");
    }

    fn on_response(&self, method: &str, elapsed: Duration) {
        tracing::debug!(
            method = %method,
            duration_secs = elapsed.as_secs_f64(),
            "Control request completed"
        );
    }

    fn on_error(&self, method: &str, error: &Error, elapsed: Duration) {
        if error.is_timeout() {
            tracing::warn!(
                method = %method,
                duration_secs = elapsed.as_secs_f64(),
                "Control request timed out"
            );
        } else {
            tracing::error!(method = %method, error = %error, "Control request failed");
        }
    }
}

/// Observability configuration
///
/// # Defaults
///
/// - Service name: "kamkit"
/// - Service version: crate version
/// - OTLP endpoint: `$OTEL_EXPORTER_OTLP_ENDPOINT` or "http://localhost:4317"
/// - Traces and metrics export: disabled (local JSON logs only)
/// - Log level: `$RUST_LOG` or "info"
///
/// ```rust
/// use kamkit_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::new("kam-admin")
///     .with_endpoint("http://collector:4317")
///     .with_log_level("debug")
///     .with_traces(true);
/// assert!(config.enable_traces);
/// assert!(!config.enable_metrics);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to every exported span and metric
    pub service_name: String,
    /// Service version attached to every exported span and metric
    pub service_version: String,
    /// OTLP gRPC endpoint of the collector
    pub otlp_endpoint: String,
    /// Export spans over OTLP
    pub enable_traces: bool,
    /// Export metrics over OTLP
    pub enable_metrics: bool,
    /// Log filter directive used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "kamkit".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: false,
            enable_metrics: false,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration for the named service with default settings
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the fallback log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Toggle OTLP span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Toggle OTLP metric export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    fn resource(&self) -> opentelemetry_sdk::Resource {
        opentelemetry_sdk::Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Providers owned by [`init_observability`], kept for [`shutdown_observability`]
struct Telemetry {
    initialized: bool,
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl Telemetry {
    const fn new() -> Self {
        Self {
            initialized: false,
            tracer_provider: None,
            meter_provider: None,
        }
    }

    /// Flush and stop every provider still held
    fn shutdown_providers(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Tracer provider shutdown failed");
            }
        }
        if let Some(provider) = self.meter_provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Meter provider shutdown failed");
            }
        }
    }
}

static TELEMETRY: Mutex<Telemetry> = Mutex::new(Telemetry::new());

fn telemetry() -> MutexGuard<'static, Telemetry> {
    TELEMETRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install the process-wide subscriber and exporters
///
/// The first successful call wins. Later calls return `Ok(())` without
/// touching the installed subscriber, so every observed client in a process
/// can ask for it.
///
/// OTLP exporters need a running Tokio runtime when traces or metrics are
/// enabled.
pub fn init_observability(
    config: ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut state = telemetry();
    if state.initialized {
        tracing::debug!(service_name = %config.service_name, "Observability already initialized");
        return Ok(());
    }

    let tracer = if config.enable_traces {
        let (tracer, provider) = init_tracer(&config)?;
        state.tracer_provider = Some(provider);
        Some(tracer)
    } else {
        None
    };

    if config.enable_metrics {
        state.meter_provider = Some(init_metrics(&config)?);
    }

    init_tracing_subscriber(&config, tracer)?;
    state.initialized = true;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        "Observability initialized"
    );

    Ok(())
}

fn init_tracer(
    config: &ObservabilityConfig,
) -> Result<(Tracer, SdkTracerProvider), Box<dyn std::error::Error + Send + Sync>> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    // The subscriber layer needs the tracer before the provider goes global.
    let tracer = provider.tracer(config.service_name.clone());
    global::set_tracer_provider(provider.clone());

    Ok((tracer, provider))
}

fn init_metrics(
    config: &ObservabilityConfig,
) -> Result<SdkMeterProvider, Box<dyn std::error::Error + Send + Sync>> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(30))
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    global::set_meter_provider(provider.clone());
    Ok(provider)
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<Tracer>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    build_subscriber(config, tracer)?.try_init()?;
    Ok(())
}

/// Registry with the optional OpenTelemetry layer, env filter and JSON output
fn build_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<Tracer>,
) -> Result<impl tracing::Subscriber + Send + Sync + 'static, ParseError> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .json();

    Ok(tracing_subscriber::registry()
        .with(tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer)))
        .with(env_filter)
        .with(fmt_layer))
}

/// Flush and stop telemetry before exit
///
/// Shuts down the tracer and meter providers installed by
/// [`init_observability`], exporting whatever they still buffer. Safe to
/// call more than once; later calls find nothing left to stop.
pub fn shutdown_observability() {
    telemetry().shutdown_providers();
    tracing::info!("Observability shutdown");
}
