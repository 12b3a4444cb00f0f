use crate::error::{CatalogError, Result};
use crate::retry::{with_retry_if, RetryConfig};
use crate::services::http::{ensure_success, is_retryable_error, normalize_base_url};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const SERVICE: &str = "managed services registry";

/// Service id under which the localization service is registered.
pub const LOCALIZATION_SERVICE_ID: &str = "ax-localization-service";

/// Administrative registry of which managed services are enabled for the
/// tenant environment.
#[async_trait]
pub trait ManagedServices: Send + Sync {
    async fn is_service_enabled(&self, service_id: &str, jwt: &str) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct ManagedServiceStatus {
    enabled: bool,
}

/// Registry client (`GET {base}/managed-services/{service_id}`).
///
/// A service the registry does not know about counts as disabled.
pub struct HttpManagedServices {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpManagedServices {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            retry: RetryConfig::external_call(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl ManagedServices for HttpManagedServices {
    async fn is_service_enabled(&self, service_id: &str, jwt: &str) -> Result<bool> {
        let url = format!("{}/managed-services/{}", self.base_url, service_id);

        let enabled = with_retry_if(
            &self.retry,
            "Managed service status",
            || async {
                let response = self
                    .client
                    .get(&url)
                    .bearer_auth(jwt)
                    .send()
                    .await
                    .context("Failed to query managed service status")?;

                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Ok(false);
                }

                let status: ManagedServiceStatus = ensure_success(SERVICE, response)
                    .await?
                    .json()
                    .await
                    .context("Failed to parse managed service status")?;

                Ok::<_, anyhow::Error>(status.enabled)
            },
            is_retryable_error,
        )
        .await
        .map_err(|e: anyhow::Error| CatalogError::unavailable(SERVICE, format!("{:#}", e)))?;

        debug!("Managed service '{}' enabled: {}", service_id, enabled);
        Ok(enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn registry(server: &MockServer) -> HttpManagedServices {
        HttpManagedServices::new(reqwest::Client::new(), &server.uri())
            .with_retry(RetryConfig::new(2, Duration::from_millis(5)))
    }

    #[tokio::test]
    async fn test_enabled_service() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/managed-services/{}", LOCALIZATION_SERVICE_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"enabled": true})))
            .mount(&mock_server)
            .await;

        let enabled = registry(&mock_server)
            .is_service_enabled(LOCALIZATION_SERVICE_ID, "jwt")
            .await
            .unwrap();
        assert!(enabled);
    }

    #[tokio::test]
    async fn test_unknown_service_is_disabled() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let enabled = registry(&mock_server)
            .is_service_enabled("unknown-service", "jwt")
            .await
            .unwrap();
        assert!(!enabled);
    }

    #[tokio::test]
    async fn test_registry_down_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&mock_server)
            .await;

        let result = registry(&mock_server)
            .is_service_enabled(LOCALIZATION_SERVICE_ID, "jwt")
            .await;
        assert!(result.is_err());
    }
}
