use anyhow::Result;
use thiserror::Error;

/// Non-success HTTP response from a collaborator.
#[derive(Debug, Error)]
#[error("{service} responded with HTTP {status}: {body}")]
pub struct HttpStatusError {
    pub service: &'static str,
    pub status: u16,
    pub body: String,
}

/// GraphQL-level errors returned alongside a 200 response.
#[derive(Debug, Error)]
#[error("{service} returned GraphQL errors: {}", .messages.join("; "))]
pub struct GraphQlError {
    pub service: &'static str,
    pub messages: Vec<String>,
}

/// Determine if an error is retryable (5xx errors, 429 rate limit, network errors).
/// Other 4xx client errors and GraphQL errors should not be retried.
pub fn is_retryable_error(error: &anyhow::Error) -> bool {
    if let Some(status_error) = error.downcast_ref::<HttpStatusError>() {
        return status_error.status == 429 || status_error.status >= 500;
    }
    if error.downcast_ref::<GraphQlError>().is_some() {
        return false;
    }

    // Network errors, timeouts, and other transient failures
    true
}

/// Turn a non-success response into an [`HttpStatusError`].
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
    Err(HttpStatusError {
        service,
        status: status.as_u16(),
        body,
    }
    .into())
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16) -> anyhow::Error {
        HttpStatusError {
            service: "image service",
            status,
            body: String::new(),
        }
        .into()
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_error(&status_error(500)));
        assert!(is_retryable_error(&status_error(503)));
        assert!(is_retryable_error(&status_error(429)));
    }

    #[test]
    fn test_client_errors_not_retryable() {
        assert!(!is_retryable_error(&status_error(400)));
        assert!(!is_retryable_error(&status_error(401)));
        assert!(!is_retryable_error(&status_error(404)));
    }

    #[test]
    fn test_graphql_errors_not_retryable() {
        let error: anyhow::Error = GraphQlError {
            service: "schedule service",
            messages: vec!["field not found".to_string()],
        }
        .into();
        assert!(!is_retryable_error(&error));
        assert!(error.to_string().contains("field not found"));
    }

    #[test]
    fn test_other_errors_retryable() {
        assert!(is_retryable_error(&anyhow::anyhow!("connection reset")));
    }

    #[test]
    fn test_context_keeps_status_downcastable() {
        use anyhow::Context;
        let error = Err::<(), _>(status_error(404))
            .context("Failed to resolve images")
            .unwrap_err();
        assert!(!is_retryable_error(&error));
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://host/api/"), "http://host/api");
        assert_eq!(normalize_base_url("http://host"), "http://host");
    }
}
