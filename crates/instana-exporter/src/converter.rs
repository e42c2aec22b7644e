//! Span Converter
//!
//! Maps one generic [`Span`] onto one [`WireSpan`]. Conversion is total: ids of
//! unexpected width are padded or truncated and negative durations are
//! clamped, so a single malformed span never fails the batch it travels in.

use crate::span::{AttributeValue, Span, SpanId, SpanKind, SpanStatus, TraceId};
use crate::wire::{FromSection, SpanData, WireSpan, OTEL_SPAN_TYPE};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Width of `t` in hex characters (128 bits).
pub const TRACE_ID_HEX_LEN: usize = 32;
/// Width of `s` and `p` in hex characters (64 bits).
pub const SPAN_ID_HEX_LEN: usize = 16;

pub const ERROR_TAG: &str = "error";
pub const ERROR_DETAIL_TAG: &str = "error_detail";

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Wire kind and whether the kind marks an entry into this service.
pub fn kind_to_wire(kind: SpanKind) -> (&'static str, bool) {
    match kind {
        SpanKind::Server => ("server", true),
        SpanKind::Client => ("client", false),
        SpanKind::Producer => ("producer", false),
        SpanKind::Consumer => ("consumer", true),
        SpanKind::Internal => ("internal", false),
        SpanKind::Unspecified => ("unknown", false),
    }
}

/// Renders a trace id as `(t, lt)`.
///
/// `t` is always 32 hex characters: the trailing 32 of a longer rendering, or
/// the rendering left-padded with zeros. `lt` carries the full rendering only
/// when truncation dropped something.
pub fn render_trace_id(trace_id: &TraceId) -> (String, Option<String>) {
    let full = trace_id.to_string();
    if full.len() > TRACE_ID_HEX_LEN {
        let short = full[full.len() - TRACE_ID_HEX_LEN..].to_string();
        (short, Some(full))
    } else {
        (format!("{:0>width$}", full, width = TRACE_ID_HEX_LEN), None)
    }
}

/// Renders a span id as exactly 16 hex characters.
pub fn render_span_id(span_id: &SpanId) -> String {
    let full = span_id.to_string();
    if full.len() > SPAN_ID_HEX_LEN {
        full[full.len() - SPAN_ID_HEX_LEN..].to_string()
    } else {
        format!("{:0>width$}", full, width = SPAN_ID_HEX_LEN)
    }
}

/// Text form of an attribute value as carried in `data.tags`.
pub fn stringify_attribute(value: &AttributeValue) -> String {
    match value {
        AttributeValue::String(s) => s.clone(),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Int(i) => i.to_string(),
        AttributeValue::Float(f) => f.to_string(),
        AttributeValue::Bytes(bytes) => hex::encode(bytes),
        AttributeValue::Array(items) => {
            // elements render exactly as they would at top level
            let items: Vec<String> = items.iter().map(stringify_attribute).collect();
            serde_json::to_string(&items).unwrap_or_else(|_| items.join(","))
        }
    }
}

/// From-section of this process, resolved on first use.
pub fn process_from_section() -> &'static FromSection {
    static FROM: OnceLock<FromSection> = OnceLock::new();
    FROM.get_or_init(|| FromSection {
        entity_id: std::process::id().to_string(),
    })
}

/// Converts one span. `service_name` must already carry any fallback; the
/// converter never invents one.
pub fn convert_span(span: &Span, service_name: &str) -> WireSpan<'static> {
    let (trace_id, long_trace_id) = render_trace_id(&span.trace_id);

    let parent_id = span
        .parent_span_id
        .as_ref()
        .filter(|parent| parent.is_valid())
        .map(render_span_id);

    let (kind, is_entry) = kind_to_wire(span.kind);
    let has_trace_parent = parent_id.is_some() && is_entry;

    let mut tags = BTreeMap::new();
    for (key, value) in &span.attributes {
        tags.insert(key.clone(), stringify_attribute(value));
    }

    let mut error_count = 0;
    if span.status == SpanStatus::Error {
        error_count = 1;
        // set last so they win over user attributes of the same name
        tags.insert(ERROR_TAG.to_string(), span.status.as_str().to_string());
        tags.insert(ERROR_DETAIL_TAG.to_string(), span.status_description.clone());
    }

    let trace_state = if span.trace_state.is_empty() {
        None
    } else {
        Some(span.trace_state.clone())
    };

    WireSpan {
        trace_id,
        parent_id,
        span_id: render_span_id(&span.span_id),
        long_trace_id,
        timestamp: span.start_time_unix_nanos / NANOS_PER_MILLI,
        duration: span.duration_nanos() / NANOS_PER_MILLI,
        name: OTEL_SPAN_TYPE,
        from: process_from_section(),
        error_count,
        data: SpanData {
            kind: kind.to_string(),
            has_trace_parent,
            service: service_name.to_string(),
            operation: span.name.clone(),
            trace_state,
            tags,
        },
    }
}
