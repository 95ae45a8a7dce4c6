// Readiness checks against the query, document and deploy services.

use crate::api::{HttpClient, HttpRequest, TransportError};
use crate::config::ServiceKind;
use reqwest::Method;
use thiserror::Error;

const STATUS_PATH: &str = "/ApplicationStatus";

/// Why a service is not ready.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotReady {
    #[error("Status {0}")]
    Status(u16),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub fn description(kind: ServiceKind) -> &'static str {
    match kind {
        ServiceKind::Query => "Query API",
        ServiceKind::Document => "Document API",
        ServiceKind::Deploy => "Deploy API",
    }
}

/// Asks the service at `target` whether it is up.
pub fn check(client: &dyn HttpClient, target: &str) -> Result<(), NotReady> {
    let response = client.exchange(HttpRequest::new(
        Method::GET,
        format!("{}{}", target, STATUS_PATH),
    ))?;
    tracing::debug!(status = response.status, url = target, "application status");
    match response.status {
        200 => Ok(()),
        status => Err(NotReady::Status(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockHttpClient;

    #[test]
    fn ready_on_200() {
        let client = MockHttpClient::default().respond(200, "{}");
        assert_eq!(check(&client, "http://127.0.0.1:19071"), Ok(()));
        let request = client.last_request();
        assert_eq!(request.url, "http://127.0.0.1:19071/ApplicationStatus");
        assert_eq!(request.method, Method::GET);
    }

    #[test]
    fn not_ready_otherwise() {
        let client = MockHttpClient::default()
            .respond(503, "starting")
            .fail("connection refused");
        assert_eq!(check(&client, "http://x"), Err(NotReady::Status(503)));
        let err = check(&client, "http://x").unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn descriptions() {
        assert_eq!(description(ServiceKind::Query), "Query API");
        assert_eq!(description(ServiceKind::Document), "Document API");
        assert_eq!(description(ServiceKind::Deploy), "Deploy API");
    }
}
