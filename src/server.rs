use crate::error::CatalogError;
use crate::locale::{project, resolve, Locale, LocaleDirectory, LocaleInput, LOCALE_HEADER};
use crate::playlist::{create_program, duplicate_playlist, ProgramDraft};
use crate::publish::{EntityKind, PublishValidator};
use crate::security::{bearer_token, verify_api_key, API_KEY_HEADER};
use crate::store::{CatalogStore, PlaylistStore};
use crate::trigger::DurationPropagator;
use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<LocaleDirectory>,
    pub catalog: Arc<dyn CatalogStore>,
    pub playlists: Arc<dyn PlaylistStore>,
    pub validator: Arc<PublishValidator>,
    /// Duration propagation to the channel service, when configured
    pub propagator: Option<Arc<DurationPropagator>>,
    pub admin_api_key: String,
}

/// Build the HTTP router over the shared application state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/admin/locales/sync", post(sync_locales))
        .route("/entities/:kind/:id/localization", get(get_localization))
        .route(
            "/entities/:kind/:id/publish-validation",
            post(validate_publish),
        )
        .route("/entities/:kind/:id/duration", patch(update_duration))
        .route("/playlists/:id/duplicate", post(duplicate))
        .route("/playlists/:id/programs", post(add_program))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str),
    Catalog(CatalogError),
}

impl From<CatalogError> for ApiError {
    fn from(error: CatalogError) -> Self {
        ApiError::Catalog(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, reason.to_string()),
            ApiError::Catalog(error) => {
                let status = match &error {
                    CatalogError::EntityNotFound { .. }
                    | CatalogError::NoLocalizationAvailable { .. } => StatusCode::NOT_FOUND,
                    CatalogError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
                    CatalogError::ExternalServiceUnavailable { .. }
                    | CatalogError::PartialPropagationFailure { .. } => StatusCode::BAD_GATEWAY,
                    CatalogError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    CatalogError::Storage(_) | CatalogError::Serialization(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, error.to_string())
            }
        };

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, message);
        } else {
            warn!("Request rejected ({}): {}", status, message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn parse_kind(kind: &str) -> ApiResult<EntityKind> {
    Ok(kind.parse::<EntityKind>()?)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn sync_locales(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<Vec<LocaleInput>>,
) -> ApiResult<impl IntoResponse> {
    if !verify_api_key(header_str(&headers, API_KEY_HEADER), &state.admin_api_key) {
        return Err(ApiError::Unauthorized("invalid or missing API key"));
    }

    let locales: Vec<Locale> = input.into_iter().map(Locale::from).collect();
    let snapshot = state.directory.sync(locales)?;

    Ok(Json(json!({
        "default_locale": snapshot.default_tag(),
        "locales": snapshot.locales(),
    })))
}

async fn get_localization(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;

    // Captured once so the whole request sees one snapshot
    let snapshot = state.directory.current_snapshot();
    let requested = header_str(&headers, LOCALE_HEADER).unwrap_or("").trim();
    let resolved = resolve(requested, &snapshot);

    let rows = state.catalog.list_localized_rows(kind, &id).await?;
    let fields: BTreeMap<String, String> = project(&id, &rows, resolved.as_str())?;

    Ok(Json(json!({
        "entity_id": id,
        "locale": resolved,
        "fields": fields,
    })))
}

async fn validate_publish(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let jwt = header_str(&headers, AUTHORIZATION.as_str())
        .and_then(bearer_token)
        .ok_or(ApiError::Unauthorized("missing bearer token"))?;
    let kind = parse_kind(&kind)?;

    let result = state.validator.validate_publish(kind, &id, jwt).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct DurationPatch {
    #[serde(default)]
    duration_in_seconds: Option<f64>,
}

async fn update_duration(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Json(patch): Json<DurationPatch>,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;

    let Some(duration) = patch.duration_in_seconds else {
        let record = state
            .catalog
            .find_entity(kind, &id)
            .await?
            .ok_or_else(|| CatalogError::not_found(kind, &id))?;
        return Ok(Json(record));
    };

    if !duration.is_finite() || duration < 0.0 {
        return Err(CatalogError::InvalidConfiguration(format!(
            "invalid duration {}",
            duration
        ))
        .into());
    }

    let record = state
        .catalog
        .update_duration(kind, &id, duration)
        .await?
        .ok_or_else(|| CatalogError::not_found(kind, &id))?;
    info!("Updated duration of {} '{}' to {}s", kind, id, duration);

    if let Some(propagator) = &state.propagator {
        // The response does not wait for the channel service
        propagator.spawn(kind, &id, duration);
    }

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct DuplicateRequest {
    start_date: String,
    start_time: String,
}

async fn duplicate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DuplicateRequest>,
) -> ApiResult<impl IntoResponse> {
    let playlist = duplicate_playlist(
        state.playlists.as_ref(),
        &id,
        &request.start_date,
        &request.start_time,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

async fn add_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ProgramDraft>,
) -> ApiResult<impl IntoResponse> {
    let program = create_program(
        state.catalog.as_ref(),
        state.playlists.as_ref(),
        &id,
        draft,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(program)))
}
