use crate::publish::PublishSettings;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Service
    pub environment: String,
    pub port: u16,
    pub service_id: String,
    pub admin_api_key: String,

    // Storage (in-memory store when unset)
    pub database_url: Option<String>,

    // Locales
    pub default_locale: String,

    // Collaborators
    pub image_service_base_url: String,
    pub localization_service_base_url: String,
    pub managed_services_base_url: String,
    pub schedule_service_base_url: String,
    pub schedule_service_token: Option<String>,

    // Publish validation
    pub is_localization_enabled: bool,
    pub external_call_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| var(key).with_context(|| format!("{} not set", key));

        Ok(Self {
            // Service
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            port: var("PORT").and_then(|v| v.parse().ok()).unwrap_or(8080),
            service_id: var("SERVICE_ID").unwrap_or_else(|| "media-service".to_string()),
            admin_api_key: require("ADMIN_API_KEY")?,

            // Storage
            database_url: var("DATABASE_URL").filter(|v| !v.trim().is_empty()),

            // Locales
            default_locale: var("DEFAULT_LOCALE").unwrap_or_else(|| "en-US".to_string()),

            // Collaborators
            image_service_base_url: require("IMAGE_SERVICE_BASE_URL")?,
            localization_service_base_url: require("LOCALIZATION_SERVICE_BASE_URL")?,
            managed_services_base_url: require("MANAGED_SERVICES_BASE_URL")?,
            schedule_service_base_url: require("SCHEDULE_SERVICE_BASE_URL")?,
            schedule_service_token: var("SCHEDULE_SERVICE_TOKEN"),

            // Publish validation
            is_localization_enabled: var("IS_LOCALIZATION_ENABLED")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false),
            external_call_timeout: Duration::from_secs(
                var("EXTERNAL_CALL_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
        })
    }

    pub fn publish_settings(&self) -> PublishSettings {
        PublishSettings {
            service_id: self.service_id.clone(),
            default_locale: self.default_locale.clone(),
            is_localization_enabled: self.is_localization_enabled,
            external_call_timeout: self.external_call_timeout,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
