// HTTP transport: the request/response exchange used by every command.
// The `HttpClient` trait is the seam between command logic and the network;
// `ApiClient` is the blocking reqwest implementation used by the binary.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::time::Duration;
use thiserror::Error;

/// Per-request timeout for every call made by the CLI.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// An outgoing request, fully described before it is handed to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first header with the given name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A completed exchange. The body has always been read to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure to complete an exchange at all: connection refused, timeout,
/// DNS, or a body that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

pub trait HttpClient {
    fn exchange(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking HTTP client backed by reqwest.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient { client })
    }

    fn headers(request: &HttpRequest) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError(format!("invalid header value '{}': {}", value, e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

impl HttpClient for ApiClient {
    fn exchange(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(Self::headers(&request)?);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let res = builder.send().map_err(|e| TransportError(e.to_string()))?;
        let status = res.status().as_u16();
        // Consumes the response, so the connection is released on every path
        let body = res
            .bytes()
            .map_err(|e| TransportError(e.to_string()))?
            .to_vec();
        tracing::debug!(status, bytes = body.len(), "received response");
        Ok(HttpResponse { status, body })
    }
}
