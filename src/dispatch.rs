// Document dispatch: turns a resolved operation (or a get) into a request
// against the document service and classifies the response.

use crate::api::{HttpClient, HttpRequest, HttpResponse, TransportError};
use crate::document_id::DocumentId;
use crate::operation::DocumentOperation;
use reqwest::{Method, Url};
use serde::Serialize;
use std::fmt;

/// The classified result of one exchange with the document service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation was accepted. `body` is what should be shown to the
    /// user: empty for put/update/remove, pretty JSON (or the raw body when
    /// it is not JSON) for a get.
    Success { id: DocumentId, body: String },
    /// 4xx: the request itself was wrong.
    DocumentError { status: u16, body: String },
    /// 5xx: the container failed. `host` is `<host>:<port>` of the target.
    ServerError { host: String, status: u16, body: String },
    TransportError(TransportError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Converts to a `Result`, so failures can be propagated with `?`
    /// or handed to the progress indicator.
    pub fn into_result(self) -> Result<Outcome, Outcome> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self)
        }
    }
}

/// The user-facing message. Callers add the `Success:`/`Error:` prefix.
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success { id, .. } => write!(f, "Sent {}", id),
            Outcome::DocumentError { status, body } => {
                write!(f, "Invalid document operation: Status {}\n\n{}", status, body)
            }
            Outcome::ServerError { host, status, body } => write!(
                f,
                "Container (document API) at {}: Status {}\n\n{}",
                host, status, body
            ),
            Outcome::TransportError(cause) => write!(f, "{}", cause),
        }
    }
}

fn document_url(target: &str, id: &DocumentId) -> String {
    format!("{}/{}", target, id.to_url_path())
}

/// Sends a put, update or remove and classifies the response.
pub fn dispatch(client: &dyn HttpClient, op: &DocumentOperation, target: &str) -> Outcome {
    let mut request = HttpRequest::new(op.kind.method(), document_url(target, &op.id));
    if let Some(body) = &op.body {
        request = request
            .header("Content-Type", "application/json")
            .body(body.clone());
    }
    match client.exchange(request) {
        Ok(response) => classify(&op.id, target, response, |_| Ok(String::new())),
        Err(cause) => Outcome::TransportError(cause),
    }
}

/// Fetches one document. A successful body is re-rendered as JSON indented
/// with four spaces, or passed through unchanged when it is not JSON.
pub fn get(client: &dyn HttpClient, id: &DocumentId, target: &str) -> Outcome {
    let request = HttpRequest::new(Method::GET, document_url(target, id));
    match client.exchange(request) {
        Ok(response) => classify(id, target, response, pretty_json),
        Err(cause) => Outcome::TransportError(cause),
    }
}

fn classify<F>(id: &DocumentId, target: &str, response: HttpResponse, render: F) -> Outcome
where
    F: FnOnce(&[u8]) -> Result<String, String>,
{
    let status = response.status;
    tracing::debug!(status, id = %id, "classifying document API response");
    match status {
        200..=299 => {
            // A body that cannot be rendered is shown as received
            let body = render(&response.body).unwrap_or_else(|reason| {
                tracing::debug!(%reason, "response body is not JSON, showing it verbatim");
                response.body_text()
            });
            Outcome::Success {
                id: id.clone(),
                body,
            }
        }
        400..=499 => Outcome::DocumentError {
            status,
            body: response.body_text(),
        },
        _ => Outcome::ServerError {
            host: host_of(target),
            status,
            body: response.body_text(),
        },
    }
}

/// `<host>:<port>` of a target URL, falling back to the target itself.
fn host_of(target: &str) -> String {
    match Url::parse(target) {
        Ok(url) => match (url.host_str(), url.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => target.to_string(),
        },
        Err(_) => target.to_string(),
    }
}

/// Re-indents a JSON document with four spaces.
pub fn pretty_json(body: &[u8]) -> Result<String, String> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer).map_err(|e| e.to_string())?;
    String::from_utf8(out).map_err(|e| e.to_string())
}
