//! # Instana Exporter Demo
//!
//! Builds a few small traces, exports them as bundles to the configured
//! serverless acceptor, then shuts the exporter down.
//!
//! ## Environment
//!
//! - `INSTANA_ENDPOINT_URL`: serverless acceptor base URL (required)
//! - `INSTANA_AGENT_KEY`: agent key (required)
//! - `INSTANA_LOG_LEVEL`: `error` | `warn` | `info` | `debug` (default: `error`)
//!
//! ## Running
//!
//! ```bash
//! # 3 traces (default)
//! cargo run -p instana-exporter --bin demo
//!
//! # 10 traces, one bundle per trace
//! cargo run -p instana-exporter --bin demo -- --traces 10
//!
//! # override INSTANA_LOG_LEVEL to see the exported payloads
//! cargo run -p instana-exporter --bin demo -- --log-level debug
//! ```

use anyhow::Context as _;
use instana_exporter::{
    init_logging, AttributeValue, ExportContext, ExporterConfig, InstanaExporter, LogLevel, Span,
    SpanBatch, SpanExporter, SpanKind, SpanStatus,
};
use rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let mut config = ExporterConfig::from_env().context("loading exporter configuration")?;
    if let Some(level) = args.log_level {
        config = config.with_log_level(level);
    }
    init_logging(config.log_level).ok();

    let traces = args.traces;
    let exporter = InstanaExporter::new(config);

    println!("Exporting {} trace(s) to {}", traces, exporter.config().bundle_url());

    let mut failures = 0;
    for i in 0..traces {
        let batch = build_trace(i);
        let spans = batch.len();
        let ctx = ExportContext::with_timeout(EXPORT_TIMEOUT);

        match exporter.export(&ctx, batch).await {
            Ok(()) => println!("  trace {:>3}: {} spans exported", i, spans),
            Err(e) => {
                failures += 1;
                let hint = if e.is_retryable() { " (retryable)" } else { "" };
                println!("  trace {:>3}: export failed: {}{}", i, e, hint);
            }
        }
    }

    exporter
        .shutdown(&ExportContext::with_timeout(EXPORT_TIMEOUT))
        .await
        .context("shutting down exporter")?;

    let metrics = exporter.metrics();
    println!();
    println!("Bundles exported: {}", metrics.bundles_exported());
    println!("Spans exported:   {}", metrics.spans_exported());
    println!("Export errors:    {}", metrics.export_errors());

    if failures > 0 {
        anyhow::bail!("{failures} of {traces} exports failed");
    }
    Ok(())
}

struct DemoArgs {
    traces: usize,
    log_level: Option<LogLevel>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<DemoArgs> {
    let mut parsed = DemoArgs {
        traces: 3,
        log_level: None,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--traces" => {
                let value = args.next().context("--traces needs a value")?;
                parsed.traces = value.parse().context("--traces must be a number")?;
            }
            "--log-level" => {
                let value = args.next().context("--log-level needs a value")?;
                parsed.log_level = Some(LogLevel::parse(&value));
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(parsed)
}

/// One inbound request: a server entry span with a database and a cache call
/// beneath it, every fifth trace failing.
fn build_trace(seq: usize) -> SpanBatch {
    let mut rng = rand::thread_rng();
    let trace_id: u128 = rng.gen_range(1..=u128::MAX);
    let entry_id: u64 = rng.gen_range(1..=u64::MAX);
    let start = now_unix_nanos();
    let failed = seq % 5 == 4;

    let mut entry = Span::new(trace_id, entry_id, "GET /api/v1/users", SpanKind::Server)
        .with_scope_name("users-api")
        .with_timing(start, start + ms(40 + rng.gen_range(0..20)));
    entry.set_attribute("http.method", "GET");
    entry.set_attribute("http.route", "/api/v1/users");
    entry.set_attribute("http.status_code", if failed { 500_i64 } else { 200_i64 });
    if failed {
        entry = entry.with_status(SpanStatus::Error, "upstream database timeout");
    }

    let mut query = Span::new(trace_id, rng.gen_range(1..=u64::MAX), "SELECT users", SpanKind::Client)
        .with_parent(entry_id)
        .with_scope_name("users-api")
        .with_timing(start + ms(2), start + ms(30));
    query.set_attribute("db.system", "postgresql");
    query.set_attribute("db.statement", "SELECT * FROM users WHERE active = ?");
    query.set_attribute("db.rows_affected", (seq % 100) as i64);

    let mut cache = Span::new(trace_id, rng.gen_range(1..=u64::MAX), "cache.get", SpanKind::Client)
        .with_parent(entry_id)
        .with_timing(start + ms(31), start + ms(32));
    cache.set_attribute("cache.hit", seq % 3 != 0);
    cache.set_attribute(
        "cache.keys",
        AttributeValue::Array(vec![format!("user:{seq}").into(), "users:active".into()]),
    );

    SpanBatch::with_spans(vec![entry, query, cache])
}

fn ms(millis: u64) -> u64 {
    millis * 1_000_000
}

fn now_unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
