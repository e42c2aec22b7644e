//! Export Coordinator
//!
//! [`InstanaExporter`] turns a [`SpanBatch`] into one Instana bundle and posts
//! it to the serverless acceptor. It performs no retries and keeps no state
//! across calls apart from the shutdown flag, metrics and the last error.
//!
//! `export` and `shutdown` may run concurrently. Shutdown cancels the
//! exporter's root scope; every in-flight export observes that as a
//! cancellation of its own context and returns promptly.

use crate::config::ExporterConfig;
use crate::context::{ContextError, ExportContext};
use crate::converter::convert_span;
use crate::shutdown::{ExporterState, ShutdownState};
use crate::span::SpanBatch;
use crate::transport::{BundleRequest, HttpClient, ReqwestClient, TransportError};
use crate::wire::Bundle;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info, Level};

/// Service name used when a span's instrumentation scope has no name.
pub const DEFAULT_SERVICE_NAME: &str = "unknown_service_name";

/// Error types for span export operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Endpoint URL or agent key missing
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Caller context cancelled or past its deadline, including cancellation by shutdown
    #[error(transparent)]
    Context(#[from] ContextError),
    /// Bundle could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Non-2xx response or network failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ExportError {
    /// HTTP status of a rejected bundle, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(TransportError::Status { status }) => Some(*status),
            _ => None,
        }
    }

    /// Hint for the caller's retry policy; the exporter itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(TransportError::Request(_)) => true,
            Self::Transport(TransportError::Status { status }) => {
                *status == 429 || (500..=599).contains(status)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownError {
    #[error("shutdown: {0}")]
    Context(#[from] ContextError),
}

/// Trait for exporting span batches to a tracing backend.
///
/// Uses native async fn in traits instead of `#[async_trait]`; see
/// [`SpanExporterBoxed`] for dynamic dispatch.
pub trait SpanExporter: Send + Sync {
    /// Exports a batch of spans, honoring `ctx` cancellation and deadline.
    fn export(
        &self,
        ctx: &ExportContext,
        batch: SpanBatch,
    ) -> impl Future<Output = Result<(), ExportError>> + Send;

    /// Stops accepting spans and cancels in-flight exports. Idempotent.
    fn shutdown(&self, ctx: &ExportContext)
        -> impl Future<Output = Result<(), ShutdownError>> + Send;

    /// Returns the exporter name for debugging.
    fn name(&self) -> &str;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of SpanExporter for dynamic dispatch.
pub trait SpanExporterBoxed: Send + Sync {
    fn export_boxed<'a>(
        &'a self,
        ctx: &'a ExportContext,
        batch: SpanBatch,
    ) -> BoxFuture<'a, Result<(), ExportError>>;

    fn shutdown_boxed<'a>(&'a self, ctx: &'a ExportContext)
        -> BoxFuture<'a, Result<(), ShutdownError>>;

    fn name(&self) -> &str;
}

/// Blanket implementation: any SpanExporter can be used as SpanExporterBoxed
impl<T: SpanExporter> SpanExporterBoxed for T {
    fn export_boxed<'a>(
        &'a self,
        ctx: &'a ExportContext,
        batch: SpanBatch,
    ) -> BoxFuture<'a, Result<(), ExportError>> {
        Box::pin(self.export(ctx, batch))
    }

    fn shutdown_boxed<'a>(
        &'a self,
        ctx: &'a ExportContext,
    ) -> BoxFuture<'a, Result<(), ShutdownError>> {
        Box::pin(self.shutdown(ctx))
    }

    fn name(&self) -> &str {
        SpanExporter::name(self)
    }
}

/// Thread-safe export counters
#[derive(Debug, Default)]
pub struct ExportMetrics {
    spans_exported: AtomicU64,
    bundles_exported: AtomicU64,
    export_errors: AtomicU64,
    inflight_exports: AtomicU64,
}

impl ExportMetrics {
    pub fn spans_exported(&self) -> u64 {
        self.spans_exported.load(Ordering::Relaxed)
    }

    pub fn bundles_exported(&self) -> u64 {
        self.bundles_exported.load(Ordering::Relaxed)
    }

    pub fn export_errors(&self) -> u64 {
        self.export_errors.load(Ordering::Relaxed)
    }

    pub fn inflight_exports(&self) -> u64 {
        self.inflight_exports.load(Ordering::Relaxed)
    }

    fn record_success(&self, span_count: u64) {
        self.spans_exported.fetch_add(span_count, Ordering::Relaxed);
        self.bundles_exported.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.export_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Keeps `inflight_exports` accurate even when the export future is dropped.
struct InflightGuard<'a>(&'a ExportMetrics);

impl<'a> InflightGuard<'a> {
    fn new(metrics: &'a ExportMetrics) -> Self {
        metrics.inflight_exports.fetch_add(1, Ordering::Relaxed);
        Self(metrics)
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.0.inflight_exports.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Converts OTel spans into Instana bundles and uploads them.
pub struct InstanaExporter<C: HttpClient = ReqwestClient> {
    client: C,
    config: ExporterConfig,
    shutdown: ShutdownState,
    metrics: ExportMetrics,
    last_error: Mutex<Option<ExportError>>,
}

impl InstanaExporter<ReqwestClient> {
    /// Creates an exporter using a default `reqwest` client.
    pub fn new(config: ExporterConfig) -> Self {
        Self::with_client(config, ReqwestClient::new())
    }

    /// Creates an exporter from `INSTANA_ENDPOINT_URL` / `INSTANA_AGENT_KEY`.
    ///
    /// # Panics
    ///
    /// Panics if either variable is missing or empty.
    pub fn from_env() -> Self {
        match ExporterConfig::from_env() {
            Ok(config) => Self::new(config),
            Err(e) => panic!("instana exporter misconfigured: {e}"),
        }
    }
}

impl<C: HttpClient> InstanaExporter<C> {
    /// Creates an exporter posting through `client`.
    pub fn with_client(config: ExporterConfig, client: C) -> Self {
        Self {
            client,
            config,
            shutdown: ShutdownState::new(),
            metrics: ExportMetrics::default(),
            last_error: Mutex::new(None),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ExporterState {
        self.shutdown.state()
    }

    /// Returns the export counters.
    pub fn metrics(&self) -> &ExportMetrics {
        &self.metrics
    }

    /// The most recent export failure, if any.
    pub fn last_error(&self) -> Option<ExportError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Converts every span in order and encodes the bundle as JSON.
    pub fn encode_bundle(&self, batch: &SpanBatch) -> Result<Vec<u8>, ExportError> {
        let spans = batch
            .spans
            .iter()
            .map(|span| {
                let service_name = if span.scope_name.is_empty() {
                    DEFAULT_SERVICE_NAME
                } else {
                    span.scope_name.as_str()
                };
                convert_span(span, service_name)
            })
            .collect();

        serde_json::to_vec(&Bundle { spans })
            .map_err(|e| ExportError::Serialization(e.to_string()))
    }

    fn bundle_request(&self, body: Vec<u8>) -> BundleRequest {
        BundleRequest {
            url: self.config.bundle_url(),
            headers: vec![
                ("content-type", "application/json".to_string()),
                ("user-agent", USER_AGENT.to_string()),
                ("x-instana-key", self.config.agent_key.clone()),
                ("x-instana-host", "host".to_string()),
                ("x-instana-time", "0".to_string()),
            ],
            body,
        }
    }

    fn fail(&self, err: ExportError) -> ExportError {
        error!(error = %err, "export failed");
        self.metrics.record_error();
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(err.clone());
        err
    }
}

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

impl<C: HttpClient> SpanExporter for InstanaExporter<C> {
    async fn export(&self, ctx: &ExportContext, batch: SpanBatch) -> Result<(), ExportError> {
        debug!(spans = batch.len(), "export called");

        if self.shutdown.is_shutdown() {
            debug!("exporter is shut down, dropping batch");
            return Ok(());
        }

        if let Some(cause) = ctx.err() {
            return Err(self.fail(cause.into()));
        }

        if batch.is_empty() {
            debug!("no spans to export");
            return Ok(());
        }

        if let Err(e) = self.config.validate() {
            return Err(self.fail(ExportError::Configuration(e.to_string())));
        }

        let body = self.encode_bundle(&batch).map_err(|e| self.fail(e))?;
        let payload = tracing::enabled!(Level::DEBUG).then(|| body.clone());
        let request = self.bundle_request(body);
        let url = request.url.clone();

        let scope = self.shutdown.export_scope();
        let _inflight = InflightGuard::new(&self.metrics);

        let outcome = tokio::select! {
            biased;
            response = self.client.post(request) => match response {
                Ok(response) if response.is_success() => Ok(()),
                Ok(response) => Err(ExportError::Transport(TransportError::Status {
                    status: response.status,
                })),
                Err(e) => Err(ExportError::Transport(e)),
            },
            cause = ctx.done() => Err(ExportError::Context(cause)),
            () = scope.cancelled() => {
                info!("export cancelled by exporter shutdown");
                Err(ExportError::Context(ContextError::Cancelled))
            }
        };

        match outcome {
            Ok(()) => {
                self.metrics.record_success(batch.len() as u64);
                info!(spans = batch.len(), url = %url, "bundle exported");
                if let Some(payload) = payload {
                    debug!(bundle = %pretty_json(&payload), "exported bundle");
                }
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn shutdown(&self, ctx: &ExportContext) -> Result<(), ShutdownError> {
        info!("exporter is shutting down");

        if self.shutdown.initiate() {
            info!("notified in-flight exports to stop");
        }

        if let Some(cause) = ctx.err() {
            error!(error = %cause, "exporter shut down with context error");
            return Err(ShutdownError::Context(cause));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "instana"
    }
}

fn pretty_json(payload: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(payload)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| String::from_utf8_lossy(payload).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelScope;
    use crate::span::{Span, SpanKind, SpanStatus};
    use crate::transport::HttpResponse;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone)]
    enum Reply {
        Status(u16),
        Fail(String),
        Hang,
    }

    /// Records every request and answers with a scripted reply.
    #[derive(Clone)]
    struct RecordingClient {
        reply: Reply,
        requests: Arc<Mutex<Vec<BundleRequest>>>,
    }

    impl RecordingClient {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request(&self, idx: usize) -> BundleRequest {
            self.requests.lock().unwrap()[idx].clone()
        }

        fn body(&self, idx: usize) -> Value {
            serde_json::from_slice(&self.request(idx).body).unwrap()
        }
    }

    impl HttpClient for RecordingClient {
        async fn post(&self, request: BundleRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            match self.reply.clone() {
                Reply::Status(status) => Ok(HttpResponse { status }),
                Reply::Fail(cause) => Err(TransportError::Request(cause)),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    fn exporter(reply: Reply) -> (InstanaExporter<RecordingClient>, RecordingClient) {
        let client = RecordingClient::new(reply);
        let config = ExporterConfig::new("http://collector.example/", "K");
        (InstanaExporter::with_client(config, client.clone()), client)
    }

    fn my_span() -> Span {
        let start = 1_700_000_000_000_000_000;
        Span::new(0xabcdef_u128, 0x42_u64, "my_span", SpanKind::Server)
            .with_timing(start, start + 5_000_000)
            .with_scope_name("my-test01")
    }

    fn batch_of(spans: Vec<Span>) -> SpanBatch {
        SpanBatch::with_spans(spans)
    }

    async fn wait_for_request(client: &RecordingClient) {
        while client.request_count() == 0 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_single_server_span_bundle() {
        let (exporter, client) = exporter(Reply::Status(200));

        exporter
            .export(&ExportContext::background(), batch_of(vec![my_span()]))
            .await
            .unwrap();

        assert_eq!(client.request_count(), 1);
        let request = client.request(0);
        assert_eq!(request.url, "http://collector.example/bundle");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("x-instana-key"), Some("K"));
        assert_eq!(request.header("x-instana-host"), Some("host"));
        assert!(request.header("user-agent").unwrap().starts_with("instana-exporter/"));

        let body = client.body(0);
        let spans = body["spans"].as_array().unwrap();
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span["n"], "otel");
        assert_eq!(span["d"], 5);
        assert_eq!(span["t"].as_str().unwrap().len(), 32);
        assert_eq!(span["s"], "0000000000000042");
        assert_eq!(span["data"]["kind"], "server");
        assert_eq!(span["data"]["service"], "my-test01");
        assert_eq!(span["data"]["operation"], "my_span");
        assert!(span.get("p").is_none());
        assert!(span.get("ec").is_none());
        assert!(span["data"].get("tp").is_none());

        assert_eq!(exporter.metrics().spans_exported(), 1);
        assert_eq!(exporter.metrics().bundles_exported(), 1);
        assert_eq!(exporter.metrics().inflight_exports(), 0);
        assert!(exporter.last_error().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_transport_error_without_retry() {
        let (exporter, client) = exporter(Reply::Status(500));

        let err = exporter
            .export(&ExportContext::background(), batch_of(vec![my_span()]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExportError::Transport(TransportError::Status { status: 500 })
        );
        assert_eq!(err.status(), Some(500));
        assert!(err.is_retryable());
        assert_eq!(client.request_count(), 1);
        assert_eq!(exporter.last_error(), Some(err));
        assert_eq!(exporter.metrics().export_errors(), 1);
        assert_eq!(exporter.metrics().bundles_exported(), 0);
    }

    #[tokio::test]
    async fn test_client_error_status_is_not_retryable() {
        let (exporter, _client) = exporter(Reply::Status(401));
        let err = exporter
            .export(&ExportContext::background(), batch_of(vec![my_span()]))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_network_failure_is_transport_error() {
        let (exporter, client) = exporter(Reply::Fail("connection refused".to_string()));

        let err = exporter
            .export(&ExportContext::background(), batch_of(vec![my_span()]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExportError::Transport(TransportError::Request("connection refused".to_string()))
        );
        assert_eq!(err.status(), None);
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let (exporter, client) = exporter(Reply::Status(200));

        exporter
            .export(&ExportContext::background(), SpanBatch::new())
            .await
            .unwrap();

        assert_eq!(client.request_count(), 0);
        assert_eq!(exporter.metrics().bundles_exported(), 0);
    }

    #[tokio::test]
    async fn test_export_after_shutdown_is_a_no_op() {
        let (exporter, client) = exporter(Reply::Status(200));
        let ctx = ExportContext::background();

        exporter.shutdown(&ctx).await.unwrap();
        assert_eq!(exporter.state(), ExporterState::Shutdown);

        exporter.export(&ctx, batch_of(vec![my_span()])).await.unwrap();
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_context_makes_no_request() {
        let (exporter, client) = exporter(Reply::Status(200));
        let ctx = ExportContext::background();
        ctx.cancel();

        let err = exporter
            .export(&ctx, batch_of(vec![my_span()]))
            .await
            .unwrap_err();

        assert_eq!(err, ExportError::Context(ContextError::Cancelled));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_makes_no_request() {
        let (exporter, client) = exporter(Reply::Status(200));
        let ctx = ExportContext::with_timeout(Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = exporter
            .export(&ctx, batch_of(vec![my_span()]))
            .await
            .unwrap_err();

        assert_eq!(err, ExportError::Context(ContextError::DeadlineExceeded));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_configuration_fails_every_call() {
        let client = RecordingClient::new(Reply::Status(200));
        let exporter =
            InstanaExporter::with_client(ExporterConfig::new("http://collector.example", ""), client.clone());

        for _ in 0..2 {
            let err = exporter
                .export(&ExportContext::background(), batch_of(vec![my_span()]))
                .await
                .unwrap_err();
            assert!(matches!(err, ExportError::Configuration(_)));
        }

        assert_eq!(exporter.state(), ExporterState::Active);
        assert_eq!(client.request_count(), 0);

        let exporter =
            InstanaExporter::with_client(ExporterConfig::new("", "K"), client.clone());
        let err = exporter
            .export(&ExportContext::background(), batch_of(vec![my_span()]))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_inflight_export() {
        let (exporter, client) = exporter(Reply::Hang);
        let exporter = Arc::new(exporter);

        let task = {
            let exporter = Arc::clone(&exporter);
            tokio::spawn(async move {
                exporter
                    .export(&ExportContext::background(), batch_of(vec![my_span()]))
                    .await
            })
        };

        wait_for_request(&client).await;
        assert_eq!(exporter.metrics().inflight_exports(), 1);

        exporter.shutdown(&ExportContext::background()).await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("export was not unblocked by shutdown")
            .unwrap();
        assert_eq!(result, Err(ExportError::Context(ContextError::Cancelled)));
        assert_eq!(exporter.metrics().inflight_exports(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_deadline_aborts_inflight_export() {
        let (exporter, client) = exporter(Reply::Hang);
        let ctx = ExportContext::with_timeout(Duration::from_millis(100));

        let err = exporter
            .export(&ctx, batch_of(vec![my_span()]))
            .await
            .unwrap_err();

        assert_eq!(err, ExportError::Context(ContextError::DeadlineExceeded));
        assert_eq!(client.request_count(), 1);
        assert_eq!(exporter.state(), ExporterState::Active);
    }

    #[tokio::test]
    async fn test_caller_cancel_aborts_inflight_export() {
        let (exporter, client) = exporter(Reply::Hang);
        let exporter = Arc::new(exporter);
        let ctx = ExportContext::background();

        let task = {
            let exporter = Arc::clone(&exporter);
            let ctx = ctx.clone();
            tokio::spawn(async move { exporter.export(&ctx, batch_of(vec![my_span()])).await })
        };

        wait_for_request(&client).await;
        ctx.cancel();

        let result = task.await.unwrap();
        assert_eq!(result, Err(ExportError::Context(ContextError::Cancelled)));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (exporter, _client) = exporter(Reply::Status(200));
        let ctx = ExportContext::background();

        exporter.shutdown(&ctx).await.unwrap();
        exporter.shutdown(&ctx).await.unwrap();
        assert_eq!(exporter.state(), ExporterState::Shutdown);
    }

    #[tokio::test]
    async fn test_shutdown_with_cancelled_context_still_shuts_down() {
        let (exporter, _client) = exporter(Reply::Status(200));
        let ctx = ExportContext::background();
        ctx.cancel();

        let err = exporter.shutdown(&ctx).await.unwrap_err();
        assert_eq!(err, ShutdownError::Context(ContextError::Cancelled));
        assert_eq!(exporter.state(), ExporterState::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_with_expired_deadline_still_shuts_down() {
        let (exporter, _client) = exporter(Reply::Status(200));
        let ctx = ExportContext::with_timeout(Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(5)).await;

        let err = exporter.shutdown(&ctx).await.unwrap_err();
        assert_eq!(err, ShutdownError::Context(ContextError::DeadlineExceeded));
        assert_eq!(exporter.state(), ExporterState::Shutdown);
    }

    #[tokio::test]
    async fn test_caller_scope_cancel_aborts_inflight_export() {
        let (exporter, client) = exporter(Reply::Hang);
        let exporter = Arc::new(exporter);
        let caller_scope = CancelScope::new();

        let task = {
            let exporter = Arc::clone(&exporter);
            let ctx = ExportContext::from_scope(caller_scope.child());
            tokio::spawn(async move { exporter.export(&ctx, batch_of(vec![my_span()])).await })
        };

        wait_for_request(&client).await;
        caller_scope.cancel();

        let result = task.await.unwrap();
        assert_eq!(result, Err(ExportError::Context(ContextError::Cancelled)));
        assert_eq!(exporter.state(), ExporterState::Active);
    }

    #[tokio::test]
    async fn test_concurrent_shutdown_and_export() {
        let (exporter, _client) = exporter(Reply::Status(200));
        let exporter = Arc::new(exporter);

        let mut tasks = Vec::new();
        for i in 0..8_u64 {
            let exporter = Arc::clone(&exporter);
            tasks.push(tokio::spawn(async move {
                let ctx = ExportContext::background();
                if i % 2 == 0 {
                    exporter
                        .shutdown(&ctx)
                        .await
                        .map_err(|ShutdownError::Context(cause)| ExportError::Context(cause))
                } else {
                    exporter.export(&ctx, batch_of(vec![my_span()])).await
                }
            }));
        }

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(exporter.state(), ExporterState::Shutdown);
    }

    #[tokio::test]
    async fn test_service_name_fallback_and_order() {
        let (exporter, client) = exporter(Reply::Status(200));
        let spans = vec![
            Span::new(1_u128, 1_u64, "first", SpanKind::Client).with_scope_name(""),
            Span::new(1_u128, 2_u64, "second", SpanKind::Internal).with_scope_name("lib-b"),
            Span::new(1_u128, 3_u64, "third", SpanKind::Consumer)
                .with_parent(2_u64)
                .with_status(SpanStatus::Error, "queue closed"),
        ];

        exporter
            .export(&ExportContext::background(), batch_of(spans))
            .await
            .unwrap();

        let body = client.body(0);
        let spans = body["spans"].as_array().unwrap();
        let names: Vec<&str> = spans
            .iter()
            .map(|s| s["data"]["operation"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(spans[0]["data"]["service"], DEFAULT_SERVICE_NAME);
        assert_eq!(spans[1]["data"]["service"], "lib-b");
        assert_eq!(spans[2]["data"]["tp"], true);
        assert_eq!(spans[2]["ec"], 1);
        assert_eq!(spans[2]["data"]["tags"]["error_detail"], "queue closed");
    }

    #[tokio::test]
    async fn test_boxed_dispatch() {
        let (exporter, client) = exporter(Reply::Status(202));
        let exporter: Arc<dyn SpanExporterBoxed> = Arc::new(exporter);
        let ctx = ExportContext::background();

        exporter
            .export_boxed(&ctx, batch_of(vec![my_span()]))
            .await
            .unwrap();
        exporter.shutdown_boxed(&ctx).await.unwrap();

        assert_eq!(exporter.name(), "instana");
        assert_eq!(client.request_count(), 1);
    }
}
