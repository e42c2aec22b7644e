//! Generic span data model
//!
//! These are the finished spans handed to the exporter by the instrumentation
//! SDK. The exporter only reads them; conversion into the wire schema lives in
//! [`crate::converter`].

use std::fmt;

/// Trace identifier as raw big-endian bytes.
///
/// OpenTelemetry trace ids are 16 bytes, but the type accepts any width so
/// that longer upstream ids survive conversion (see `lt` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TraceId(Vec<u8>);

impl TraceId {
    /// Creates a trace id from raw big-endian bytes of any width.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// An all-zero (or empty) id is invalid per W3C trace-context.
    pub fn is_valid(&self) -> bool {
        self.0.iter().any(|b| *b != 0)
    }
}

impl From<u128> for TraceId {
    fn from(id: u128) -> Self {
        Self(id.to_be_bytes().to_vec())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Span identifier as raw big-endian bytes (8 bytes for OpenTelemetry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpanId(Vec<u8>);

impl SpanId {
    /// Creates a span id from raw big-endian bytes of any width.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Same rule as [`TraceId::is_valid`].
    pub fn is_valid(&self) -> bool {
        self.0.iter().any(|b| *b != 0)
    }
}

impl From<u64> for SpanId {
    fn from(id: u64) -> Self {
        Self(id.to_be_bytes().to_vec())
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Span kind from the OpenTelemetry data model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpanKind {
    #[default]
    Unspecified,
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

/// Span status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error,
}

impl SpanStatus {
    /// Name of the status code, as reported in the `error` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanStatus::Unset => "Unset",
            SpanStatus::Ok => "Ok",
            SpanStatus::Error => "Error",
        }
    }
}

/// Attribute value types
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Array(Vec<AttributeValue>),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A finished span as produced by the instrumentation SDK.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    /// `None` for root spans
    pub parent_span_id: Option<SpanId>,
    pub kind: SpanKind,
    /// Operation name
    pub name: String,
    pub start_time_unix_nanos: u64,
    pub end_time_unix_nanos: u64,
    /// Attributes in recording order; keys may repeat, later wins on conversion
    pub attributes: Vec<(String, AttributeValue)>,
    pub status: SpanStatus,
    pub status_description: String,
    /// W3C `tracestate` header value, empty if absent
    pub trace_state: String,
    /// Instrumentation scope (library / logical service) name
    pub scope_name: String,
}

impl Span {
    /// Creates a root span that starts and ends now.
    pub fn new(
        trace_id: impl Into<TraceId>,
        span_id: impl Into<SpanId>,
        name: impl Into<String>,
        kind: SpanKind,
    ) -> Self {
        let now = now_unix_nanos();
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            parent_span_id: None,
            kind,
            name: name.into(),
            start_time_unix_nanos: now,
            end_time_unix_nanos: now,
            attributes: Vec::new(),
            status: SpanStatus::Unset,
            status_description: String::new(),
            trace_state: String::new(),
            scope_name: String::new(),
        }
    }

    /// Sets the parent span id.
    pub fn with_parent(mut self, parent: impl Into<SpanId>) -> Self {
        self.parent_span_id = Some(parent.into());
        self
    }

    /// Sets start and end, both in nanoseconds since the Unix epoch.
    pub fn with_timing(mut self, start_unix_nanos: u64, end_unix_nanos: u64) -> Self {
        self.start_time_unix_nanos = start_unix_nanos;
        self.end_time_unix_nanos = end_unix_nanos;
        self
    }

    /// Sets the instrumentation scope name, reported as the service.
    pub fn with_scope_name(mut self, scope_name: impl Into<String>) -> Self {
        self.scope_name = scope_name.into();
        self
    }

    /// Sets the W3C `tracestate` value.
    pub fn with_trace_state(mut self, trace_state: impl Into<String>) -> Self {
        self.trace_state = trace_state.into();
        self
    }

    /// Sets the status code and its description.
    pub fn with_status(mut self, status: SpanStatus, description: impl Into<String>) -> Self {
        self.status = status;
        self.status_description = description.into();
        self
    }

    /// Appends an attribute. Duplicate keys are kept; the last one wins on export.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.push((key.into(), value.into()));
    }

    /// Duration in nanoseconds; zero if the end precedes the start.
    pub fn duration_nanos(&self) -> u64 {
        self.end_time_unix_nanos
            .saturating_sub(self.start_time_unix_nanos)
    }
}

/// The spans handed to a single export call, in SDK order.
#[derive(Debug, Clone, Default)]
pub struct SpanBatch {
    pub spans: Vec<Span>,
}

impl SpanBatch {
    /// Creates an empty span batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a batch from spans in SDK order
    pub fn with_spans(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// Adds a span to the batch
    pub fn add(&mut self, span: Span) {
        self.spans.push(span);
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl From<Vec<Span>> for SpanBatch {
    fn from(spans: Vec<Span>) -> Self {
        Self::with_spans(spans)
    }
}

fn now_unix_nanos() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
