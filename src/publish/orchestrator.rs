use crate::error::{CatalogError, Result};
use crate::publish::{
    aggregate, calculate_validation_status, create_publish_payload, default_localization, hash,
    EntityKind, Localization, PublishDto, PublishPayload, ResolvedImage, ValidationContext,
    ValidationMessage, ValidationStatus,
};
use crate::services::{AssetService, LocalizationService, ManagedServices, LOCALIZATION_SERVICE_ID};
use crate::store::CatalogStore;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const IMAGE_NOT_FOUND: &str = "IMAGE_NOT_FOUND";
pub const IMAGE_SERVICE_UNAVAILABLE: &str = "IMAGE_SERVICE_UNAVAILABLE";
pub const LOCALIZATION_SERVICE_UNAVAILABLE: &str = "LOCALIZATION_SERVICE_UNAVAILABLE";

/// Per-deployment knobs of the publish pipeline.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    /// Id this service registers its entities under in the localization service
    pub service_id: String,
    /// Locale tag used for the synthesized default localization
    pub default_locale: String,
    pub is_localization_enabled: bool,
    /// Upper bound for each collaborator call
    pub external_call_timeout: Duration,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            service_id: "media-service".to_string(),
            default_locale: "en-US".to_string(),
            is_localization_enabled: false,
            external_call_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishValidationResult {
    pub payload: PublishPayload,
    pub validations: Vec<ValidationMessage>,
    pub status: ValidationStatus,
    pub hash: String,
}

struct Validated<T> {
    value: Vec<T>,
    validations: Vec<ValidationMessage>,
}

impl<T> Validated<T> {
    fn new(value: Vec<T>, validations: Vec<ValidationMessage>) -> Self {
        Self { value, validations }
    }
}

/// Runs the publish validation pipeline for one entity.
pub struct PublishValidator {
    store: Arc<dyn CatalogStore>,
    assets: Arc<dyn AssetService>,
    localizations: Arc<dyn LocalizationService>,
    managed: Arc<dyn ManagedServices>,
    settings: PublishSettings,
}

impl PublishValidator {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        assets: Arc<dyn AssetService>,
        localizations: Arc<dyn LocalizationService>,
        managed: Arc<dyn ManagedServices>,
        settings: PublishSettings,
    ) -> Self {
        Self {
            store,
            assets,
            localizations,
            managed,
            settings,
        }
    }

    pub fn settings(&self) -> &PublishSettings {
        &self.settings
    }

    /// Aggregate the entity and validate it.
    ///
    /// # Errors
    /// Only a missing root entity (or a storage failure while reading it)
    /// fails the call. Collaborator failures end up in `validations`.
    pub async fn validate_publish(
        &self,
        kind: EntityKind,
        id: &str,
        jwt: &str,
    ) -> Result<PublishValidationResult> {
        let dto = aggregate(self.store.as_ref(), kind, id).await?;
        self.validate(&dto, jwt).await
    }

    /// Validate images and resolve localizations concurrently, then build and
    /// hash the payload.
    pub async fn validate(&self, dto: &PublishDto, jwt: &str) -> Result<PublishValidationResult> {
        let (images, localizations) = tokio::join!(
            self.validate_images(dto, jwt),
            self.resolve_localizations(dto, jwt)
        );

        let mut validations = images.validations;
        validations.extend(localizations.validations);
        let status = calculate_validation_status(&validations);

        let payload = create_publish_payload(dto, images.value, localizations.value);
        let hash = hash(&payload)?;

        info!(
            "Publish validation for {} '{}': {:?} ({} messages), hash {}",
            dto.kind,
            dto.id,
            status,
            validations.len(),
            hash
        );

        Ok(PublishValidationResult {
            payload,
            validations,
            status,
            hash,
        })
    }

    async fn validate_images(&self, dto: &PublishDto, jwt: &str) -> Validated<ResolvedImage> {
        let ids = dto.image_ids();
        if ids.is_empty() {
            return Validated::new(Vec::new(), Vec::new());
        }

        let call = self.assets.validate_and_resolve_images(&ids, jwt);
        match bounded("image service", self.settings.external_call_timeout, call).await {
            Ok(resolution) => {
                let mut validations = resolution.validations;
                for id in &ids {
                    if !resolution.images.iter().any(|image| &image.id == id) {
                        validations.push(ValidationMessage::error(
                            ValidationContext::Image,
                            IMAGE_NOT_FOUND,
                            format!("Image '{}' could not be resolved", id),
                        ));
                    }
                }
                Validated::new(resolution.images, validations)
            }
            Err(e) => {
                warn!("Image validation for {} '{}' failed: {}", dto.kind, dto.id, e);
                let validations = ids
                    .iter()
                    .map(|id| {
                        ValidationMessage::error(
                            ValidationContext::Image,
                            IMAGE_SERVICE_UNAVAILABLE,
                            format!("Image '{}' could not be validated: {}", id, e),
                        )
                    })
                    .collect();
                Validated::new(Vec::new(), validations)
            }
        }
    }

    async fn resolve_localizations(&self, dto: &PublishDto, jwt: &str) -> Validated<Localization> {
        if !self.settings.is_localization_enabled || !self.localization_service_enabled(jwt).await {
            debug!(
                "Localization service not in use, synthesizing default localization for {} '{}'",
                dto.kind, dto.id
            );
            return Validated::new(vec![self.fallback_localization(dto)], Vec::new());
        }

        let call = self.localizations.get_localizations_and_validations(
            &dto.id,
            dto.kind,
            &self.settings.service_id,
            jwt,
        );
        match bounded(
            "localization service",
            self.settings.external_call_timeout,
            call,
        )
        .await
        {
            Ok(response) => {
                Validated::new(response.localizations.unwrap_or_default(), response.validations)
            }
            Err(e) => {
                warn!(
                    "Localization fetch for {} '{}' failed, using default localization: {}",
                    dto.kind, dto.id, e
                );
                let message = ValidationMessage::error(
                    ValidationContext::Localization,
                    LOCALIZATION_SERVICE_UNAVAILABLE,
                    format!("Localizations could not be retrieved: {}", e),
                );
                Validated::new(vec![self.fallback_localization(dto)], vec![message])
            }
        }
    }

    /// A failed enablement check counts as disabled.
    async fn localization_service_enabled(&self, jwt: &str) -> bool {
        let call = self.managed.is_service_enabled(LOCALIZATION_SERVICE_ID, jwt);
        match bounded(
            "managed services registry",
            self.settings.external_call_timeout,
            call,
        )
        .await
        {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!("Could not determine localization service status: {}", e);
                false
            }
        }
    }

    fn fallback_localization(&self, dto: &PublishDto) -> Localization {
        default_localization(
            &self.settings.default_locale,
            &dto.title,
            dto.description.as_deref(),
        )
    }
}

async fn bounded<T>(
    service: &str,
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| CatalogError::Timeout {
            service: service.to_string(),
            millis: limit.as_millis() as u64,
        })?
}
