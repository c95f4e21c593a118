//! Kamailio control-API client
//!
//! [`KamailioClient`] wraps the request builder, the HTTP transport, the
//! response validator and the extractors into one call per control command.
//! Every call goes through the same pipeline:
//!
//! ```text
//! build_request -> observer.on_request -> POST -> validate_response -> extract
//! ```
//!
//! Calls that return "raw validated text" hand back the response body as
//! received, after it has passed validation. Calls returning `()` discard the
//! body once it validates.

use crate::config::ClientConfig;
use crate::extract;
use crate::metrics::PEER_STATUS_METHOD;
use crate::transport::HttpTransport;
use kamkit_core::{codec, Result, RpcObserver, TracingObserver};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// User-location table the registrar writes to
const LOCATION_TABLE: &str = "location";

/// Client for a single Kamailio JSON-RPC endpoint
///
/// Cheap to clone; clones share the connection pool and the observer.
#[derive(Clone)]
pub struct KamailioClient {
    pub(crate) config: ClientConfig,
    pub(crate) transport: HttpTransport,
    pub(crate) observer: Arc<dyn RpcObserver>,
}

impl std::fmt::Debug for KamailioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KamailioClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl KamailioClient {
    /// Client for `url` with default deadlines and a [`TracingObserver`]
    ///
    /// For deadlines or a custom observer use [`crate::ClientBuilder`].
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(url), Arc::new(TracingObserver))
    }

    /// Client from an explicit configuration and observer
    pub fn with_config(config: ClientConfig, observer: Arc<dyn RpcObserver>) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            config,
            transport,
            observer,
        })
    }

    /// Endpoint this client talks to
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Build, send and validate one call, returning the raw body
    async fn call_at(
        &self,
        url: &str,
        method: &str,
        params: Map<String, Value>,
        insecure: bool,
    ) -> Result<String> {
        let request = codec::build_request(method, params);
        let start = Instant::now();
        self.observer.on_request(method, url);

        let sent = if insecure {
            self.transport.post_insecure(url, request).await
        } else {
            self.transport.post(url, request).await
        };
        let outcome = sent.and_then(|body| codec::validate_response(&body).map(|_| body));

        match &outcome {
            Ok(_) => self.observer.on_response(method, start.elapsed()),
            Err(e) => self.observer.on_error(method, e, start.elapsed()),
        }
        outcome
    }

    async fn call_raw(&self, method: &str, params: Map<String, Value>) -> Result<String> {
        self.call_at(&self.config.url, method, params, false).await
    }

    async fn call_unit(&self, method: &str, params: Map<String, Value>) -> Result<()> {
        self.call_raw(method, params).await.map(|_| ())
    }

    /// Add `address` to dispatcher set `group`
    #[tracing::instrument(skip(self))]
    pub async fn dispatcher_add(&self, group: &str, address: &str) -> Result<String> {
        self.call_raw(
            "dispatcher.add",
            params([("group", json!(group)), ("address", json!(address))]),
        )
        .await
    }

    /// Remove `address` from dispatcher set `group`
    #[tracing::instrument(skip(self))]
    pub async fn dispatcher_remove(&self, group: &str, address: &str) -> Result<String> {
        self.call_raw(
            "dispatcher.remove",
            params([("group", json!(group)), ("address", json!(address))]),
        )
        .await
    }

    /// Full `dispatcher.list` response
    #[tracing::instrument(skip(self))]
    pub async fn dispatcher_list(&self) -> Result<String> {
        self.call_raw("dispatcher.list", Map::new()).await
    }

    /// Destination URIs of every dispatcher set
    #[tracing::instrument(skip(self))]
    pub async fn dispatcher_list_simple(&self) -> Result<Value> {
        let body = self.call_raw("dispatcher.list", Map::new()).await?;
        extract::dispatcher_nodes(&body)
    }

    /// Dispatcher sets with their targets
    #[tracing::instrument(skip(self))]
    pub async fn dispatcher_list_by_group(&self) -> Result<Value> {
        let body = self.call_raw("dispatcher.list", Map::new()).await?;
        extract::dispatcher_groups(&body)
    }

    #[tracing::instrument(skip(self))]
    pub async fn htable_delete(&self, table: &str, key: &str) -> Result<()> {
        self.call_unit("htable.delete", params([("htable", json!(table)), ("key", json!(key))]))
            .await
    }

    /// Full `htable.dump` response for `table`
    #[tracing::instrument(skip(self))]
    pub async fn htable_dump(&self, table: &str) -> Result<String> {
        self.call_raw("htable.dump", params([("htable", json!(table))]))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn htable_flush(&self, table: &str) -> Result<()> {
        self.call_unit("htable.flush", params([("htable", json!(table))]))
            .await
    }

    /// `{value}` for `key`, or `{}` when the key is unset
    #[tracing::instrument(skip(self))]
    pub async fn htable_get(&self, table: &str, key: &str) -> Result<Value> {
        let body = self
            .call_raw("htable.get", params([("htable", json!(table)), ("key", json!(key))]))
            .await?;
        extract::htable_value_single(&body)
    }

    /// Store an integer; the value goes on the wire as a JSON number
    #[tracing::instrument(skip(self))]
    pub async fn htable_set_int(&self, table: &str, key: &str, value: i64) -> Result<()> {
        self.call_unit(
            "htable.seti",
            params([("htable", json!(table)), ("key", json!(key)), ("value", json!(value))]),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn htable_set_string(&self, table: &str, key: &str, value: &str) -> Result<()> {
        self.call_unit(
            "htable.sets",
            params([("htable", json!(table)), ("key", json!(key)), ("value", json!(value))]),
        )
        .await
    }

    /// Drop every binding of `aor` from the location table
    #[tracing::instrument(skip(self))]
    pub async fn reg_delete_aor(&self, aor: &str) -> Result<()> {
        self.call_unit("ul.rm", params([("table", json!(LOCATION_TABLE)), ("AOR", json!(aor))]))
            .await
    }

    /// Contact bindings of `aor` as [`extract::aor_contacts`] records
    #[tracing::instrument(skip(self))]
    pub async fn reg_get_aor(&self, aor: &str) -> Result<Value> {
        let body = self
            .call_raw("ul.lookup", params([("table", json!(LOCATION_TABLE)), ("AOR", json!(aor))]))
            .await?;
        extract::aor_contacts(&body)
    }

    /// Full `ul.dump` response
    #[tracing::instrument(skip(self))]
    pub async fn registrations(&self) -> Result<String> {
        self.call_raw("ul.dump", Map::new()).await
    }

    /// Seconds since the server started
    #[tracing::instrument(skip(self))]
    pub async fn uptime(&self) -> Result<Value> {
        let body = self.call_raw("core.uptime", Map::new()).await?;
        extract::uptime(&body)
    }

    #[tracing::instrument(skip(self))]
    pub async fn version(&self) -> Result<Value> {
        let body = self.call_raw("core.version", Map::new()).await?;
        extract::version(&body)
    }

    /// Call `method` on another server's control endpoint
    ///
    /// Skips certificate checks and is bounded by
    /// [`ClientConfig::peer_timeout`]. The reply is validated like any other
    /// call and returned raw.
    #[tracing::instrument(skip(self, params))]
    pub async fn peer_call(
        &self,
        url: &str,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<String> {
        self.call_at(url, method, params, true).await
    }

    /// Plain GET of `url`, returning the body as is
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String> {
        self.transport.get(url).await
    }

    /// Health-check a peer with a GET that skips certificate checks
    ///
    /// Bounded by [`ClientConfig::peer_timeout`]; the body is returned as is.
    #[tracing::instrument(skip(self))]
    pub async fn peer_status(&self, url: &str) -> Result<String> {
        let start = Instant::now();
        self.observer.on_request(PEER_STATUS_METHOD, url);

        let outcome = self.transport.get_insecure(url).await;
        match &outcome {
            Ok(_) => self.observer.on_response(PEER_STATUS_METHOD, start.elapsed()),
            Err(e) => self.observer.on_error(PEER_STATUS_METHOD, e, start.elapsed()),
        }
        outcome
    }
}

fn params<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
