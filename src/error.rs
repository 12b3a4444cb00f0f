use thiserror::Error;

/// Errors surfaced by the catalog core.
///
/// External collaborator failures (`ExternalServiceUnavailable`, `Timeout`)
/// are returned by the client traits, but the publish orchestrator never lets
/// them escape: it downgrades them into validation messages.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Locale sync input or other structural configuration is invalid
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Root entity of an aggregate or publish attempt does not exist
    #[error("{kind} '{id}' not found")]
    EntityNotFound { kind: String, id: String },

    /// Entity has neither a row for the resolved locale nor a default row
    #[error("no localization available for entity '{entity_id}' (requested locale '{locale}')")]
    NoLocalizationAvailable { entity_id: String, locale: String },

    /// A collaborator service could not be reached or answered with an error
    #[error("{service} unavailable: {message}")]
    ExternalServiceUnavailable { service: String, message: String },

    /// A collaborator call exceeded its time budget
    #[error("{service} call timed out after {millis}ms")]
    Timeout { service: String, millis: u64 },

    /// Some schedule entries could not be refreshed with a new duration
    #[error("duration propagation failed for {failed} of {total} schedule entries")]
    PartialPropagationFailure { failed: usize, total: usize },

    /// Storage collaborator failure
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn unavailable(service: &str, error: impl std::fmt::Display) -> Self {
        CatalogError::ExternalServiceUnavailable {
            service: service.to_string(),
            message: error.to_string(),
        }
    }

    pub fn not_found(kind: impl std::fmt::Display, id: &str) -> Self {
        CatalogError::EntityNotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(error: sqlx::Error) -> Self {
        CatalogError::Storage(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
