//! HTTP transport seam.
//!
//! The exporter only needs "send this request, tell me the status or why it
//! failed". [`HttpClient`] captures that so tests can script responses and the
//! production path can use [`ReqwestClient`].

use std::future::Future;
use thiserror::Error;

/// Failure to get a 2xx answer from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The backend answered with a non-2xx status.
    #[error("backend responded with HTTP status {status}")]
    Status { status: u16 },
    /// The request never produced a response (DNS, connect, TLS, I/O).
    #[error("request failed: {0}")]
    Request(String),
}

/// A fully built bundle upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl BundleRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Issues a single POST.
///
/// Dropping the returned future must abort the request; the exporter relies
/// on that for cancellation.
pub trait HttpClient: Send + Sync {
    fn post(
        &self,
        request: BundleRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// [`HttpClient`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with reqwest's default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a preconfigured client, e.g. one with a request timeout or proxy.
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

impl HttpClient for ReqwestClient {
    async fn post(&self, request: BundleRequest) -> Result<HttpResponse, TransportError> {
        let BundleRequest { url, headers, body } = request;

        let mut builder = self.inner.post(&url).body(body);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(HttpResponse {
            status: response.status().as_u16(),
        })
    }
}
