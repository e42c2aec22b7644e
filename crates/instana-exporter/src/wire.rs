//! Instana serverless acceptor wire schema
//!
//! Field names are fixed by the receiving backend; the serde renames below
//! are the compatibility contract and must not change.

use serde::Serialize;
use std::collections::BTreeMap;

/// Literal `n` value marking a span as coming from a foreign (OTel) tracer.
pub const OTEL_SPAN_TYPE: &str = "otel";

/// Top-level container posted to `<endpoint>/bundle`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bundle<'a> {
    pub spans: Vec<WireSpan<'a>>,
}

/// Identity of the reporting process (the "from" section).
///
/// The acceptor also understands optional `hl` (hostless), `cp` (cloud
/// provider) and `h` (host id) keys. This exporter only reports the entity
/// id, so those keys are never emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FromSection {
    /// Entity id, the process id for this exporter.
    #[serde(rename = "e")]
    pub entity_id: String,
}

/// Instana-side payload of an OTel span.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SpanData {
    pub kind: String,
    /// Entry span continuing a trace started elsewhere.
    #[serde(rename = "tp", skip_serializing_if = "is_false")]
    pub has_trace_parent: bool,
    pub service: String,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_state: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// One span in Instana's wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireSpan<'a> {
    #[serde(rename = "t")]
    pub trace_id: String,
    #[serde(rename = "p", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "s")]
    pub span_id: String,
    #[serde(rename = "lt", skip_serializing_if = "Option::is_none")]
    pub long_trace_id: Option<String>,
    /// Start, epoch milliseconds
    #[serde(rename = "ts")]
    pub timestamp: u64,
    /// Duration, milliseconds
    #[serde(rename = "d")]
    pub duration: u64,
    #[serde(rename = "n")]
    pub name: &'static str,
    #[serde(rename = "f")]
    pub from: &'a FromSection,
    #[serde(rename = "ec", skip_serializing_if = "is_zero")]
    pub error_count: u8,
    pub data: SpanData,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u8) -> bool {
    *value == 0
}
