//! Instana span exporter for OpenTelemetry
//!
//! Receives finished spans from an instrumentation SDK, converts them into
//! Instana's serverless bundle format and posts them to the serverless
//! acceptor at `<INSTANA_ENDPOINT_URL>/bundle`.
//!
//! Batching, scheduling and retries belong to the caller. Each
//! [`SpanExporter::export`] call is one HTTP request; spans are emitted in
//! input order and nothing is kept between calls.
//!
//! # Example
//!
//! ```no_run
//! use instana_exporter::{ExportContext, InstanaExporter, Span, SpanBatch, SpanExporter, SpanKind};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let exporter = InstanaExporter::from_env();
//!
//!     let mut batch = SpanBatch::new();
//!     batch.add(Span::new(1_u128, 1_u64, "GET /users", SpanKind::Server).with_scope_name("users-api"));
//!
//!     let ctx = ExportContext::with_timeout(Duration::from_secs(10));
//!     if let Err(e) = exporter.export(&ctx, batch).await {
//!         eprintln!("export failed: {e}");
//!     }
//!     exporter.shutdown(&ctx).await.ok();
//! }
//! ```

pub mod config;
pub mod context;
pub mod converter;
pub mod exporter;
pub mod logging;
mod shutdown;
pub mod span;
pub mod transport;
pub mod wire;

// Re-export main types
pub use config::{ConfigError, ExporterConfig, LogLevel};
pub use context::{CancelScope, ContextError, ExportContext};
pub use converter::convert_span;
pub use exporter::{
    ExportError, ExportMetrics, InstanaExporter, ShutdownError, SpanExporter, SpanExporterBoxed,
    DEFAULT_SERVICE_NAME,
};
pub use logging::init_logging;
pub use shutdown::ExporterState;
pub use span::{AttributeValue, Span, SpanBatch, SpanId, SpanKind, SpanStatus, TraceId};
pub use transport::{BundleRequest, HttpClient, HttpResponse, ReqwestClient, TransportError};
pub use wire::{Bundle, FromSection, SpanData, WireSpan};
