use crate::error::{CatalogError, Result};
use crate::publish::{EntityKind, Localization, ValidationMessage};
use crate::retry::{with_retry_if, RetryConfig};
use crate::services::http::{ensure_success, is_retryable_error, normalize_base_url};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "localization service";

/// Localizations of one entity as tracked by the localization service.
///
/// `localizations` is `None` when the service has never seen the entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizationResponse {
    #[serde(default)]
    pub localizations: Option<Vec<Localization>>,
    #[serde(default)]
    pub validations: Vec<ValidationMessage>,
}

#[async_trait]
pub trait LocalizationService: Send + Sync {
    async fn get_localizations_and_validations(
        &self,
        entity_id: &str,
        entity_kind: EntityKind,
        service_id: &str,
        jwt: &str,
    ) -> Result<LocalizationResponse>;
}

/// Localization service client (`GET {base}/localizations`).
pub struct HttpLocalizationService {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpLocalizationService {
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
impl LocalizationService for HttpLocalizationService {
    async fn get_localizations_and_validations(
        &self,
        entity_id: &str,
        entity_kind: EntityKind,
        service_id: &str,
        jwt: &str,
    ) -> Result<LocalizationResponse> {
        debug!(
            "Fetching localizations for {} '{}'",
            entity_kind, entity_id
        );
        let url = format!("{}/localizations", self.base_url);

        with_retry_if(
            &self.retry,
            "Localization fetch",
            || async {
                let response = self
                    .client
                    .get(&url)
                    .bearer_auth(jwt)
                    .query(&[
                        ("entity_id", entity_id),
                        ("entity_type", entity_kind.localization_type()),
                        ("service_id", service_id),
                    ])
                    .send()
                    .await
                    .context("Failed to send localization request")?;

                let body: LocalizationResponse = ensure_success(SERVICE, response)
                    .await?
                    .json()
                    .await
                    .context("Failed to parse localization response")?;

                Ok::<_, anyhow::Error>(body)
            },
            is_retryable_error,
        )
        .await
        .map_err(|e: anyhow::Error| CatalogError::unavailable(SERVICE, format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::Severity;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn service(server: &MockServer) -> HttpLocalizationService {
        HttpLocalizationService::new(reqwest::Client::new(), &server.uri())
            .with_retry(RetryConfig::new(2, Duration::from_millis(5)))
    }

    #[tokio::test]
    async fn test_fetch_localizations_with_validations() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/localizations"))
            .and(query_param("entity_id", "ch-1"))
            .and(query_param("entity_type", "channel"))
            .and(query_param("service_id", "channel-service"))
            .and(header("Authorization", "Bearer test-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "localizations": [
                    {"language_tag": "en-US", "is_default_locale": true, "title": "News", "description": "All news"},
                    {"language_tag": "de-DE", "is_default_locale": false, "title": "Nachrichten"}
                ],
                "validations": [
                    {"severity": "WARNING", "context": "LOCALIZATION", "code": "UNTRANSLATED", "details": "et-EE is not translated"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let response = service(&mock_server)
            .get_localizations_and_validations("ch-1", EntityKind::Channel, "channel-service", "test-jwt")
            .await
            .unwrap();

        let localizations = response.localizations.unwrap();
        assert_eq!(localizations.len(), 2);
        assert_eq!(localizations[1].title, "Nachrichten");
        assert_eq!(response.validations[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_unknown_entity_yields_no_localizations() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/localizations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"validations": []})))
            .mount(&mock_server)
            .await;

        let response = service(&mock_server)
            .get_localizations_and_validations("ep-9", EntityKind::Episode, "media-service", "jwt")
            .await
            .unwrap();

        assert!(response.localizations.is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/localizations"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&mock_server)
            .await;

        let result = service(&mock_server)
            .get_localizations_and_validations("ch-1", EntityKind::Channel, "channel-service", "jwt")
            .await;

        assert!(matches!(
            result,
            Err(CatalogError::ExternalServiceUnavailable { .. })
        ));
    }
}
