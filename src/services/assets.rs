use crate::error::{CatalogError, Result};
use crate::publish::{ResolvedImage, ValidationMessage};
use crate::retry::{with_retry_if, RetryConfig};
use crate::services::http::{ensure_success, is_retryable_error, normalize_base_url};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "image service";

/// Images the image service could resolve, plus any findings it reports
/// about them. Ids missing from `images` are unresolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageResolution {
    pub images: Vec<ResolvedImage>,
    #[serde(default)]
    pub validations: Vec<ValidationMessage>,
}

#[async_trait]
pub trait AssetService: Send + Sync {
    async fn validate_and_resolve_images(&self, ids: &[String], jwt: &str)
        -> Result<ImageResolution>;
}

#[derive(Debug, Serialize)]
struct ResolveImagesRequest<'a> {
    ids: &'a [String],
}

/// Image service client (`POST {base}/images/resolve`).
pub struct HttpAssetService {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpAssetService {
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

    async fn request(&self, ids: &[String], jwt: &str) -> anyhow::Result<ImageResolution> {
        let response = self
            .client
            .post(format!("{}/images/resolve", self.base_url))
            .bearer_auth(jwt)
            .json(&ResolveImagesRequest { ids })
            .send()
            .await
            .context("Failed to send image resolution request")?;

        let resolution: ImageResolution = ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .context("Failed to parse image resolution response")?;

        Ok(resolution)
    }
}

#[async_trait]
impl AssetService for HttpAssetService {
    async fn validate_and_resolve_images(
        &self,
        ids: &[String],
        jwt: &str,
    ) -> Result<ImageResolution> {
        debug!("Resolving {} images", ids.len());
        with_retry_if(
            &self.retry,
            "Image resolution",
            move || self.request(ids, jwt),
            is_retryable_error,
        )
        .await
        .map_err(|e| CatalogError::unavailable(SERVICE, format!("{:#}", e)))
    }
}
