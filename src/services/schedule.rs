use crate::error::{CatalogError, Result};
use crate::publish::EntityKind;
use crate::retry::{with_retry_if, RetryConfig};
use crate::services::http::{
    ensure_success, is_retryable_error, normalize_base_url, GraphQlError,
};
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const SERVICE: &str = "schedule service";

const FIND_PROGRAMS_QUERY: &str = r#"
query GetPrograms($entityId: String!, $entityType: EntityType!) {
  programs(filter: { entityId: { equalTo: $entityId }, entityType: { equalTo: $entityType } }) {
    nodes {
      id
      videoDurationInSeconds
    }
  }
}
"#;

const UPDATE_PROGRAM_MUTATION: &str = r#"
mutation UpdateProgram($id: UUID!, $patch: ProgramPatch!) {
  updateProgram(input: { id: $id, patch: $patch }) {
    program {
      id
      videoDurationInSeconds
    }
  }
}
"#;

/// A schedule entry in the dependent service that references a catalog entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntryRef {
    pub id: String,
    #[serde(default)]
    pub video_duration_in_seconds: Option<f64>,
}

/// Schedule records owned by the dependent (channel) service.
#[async_trait]
pub trait ScheduleService: Send + Sync {
    async fn find_entries(&self, entity_type: EntityKind, entity_id: &str)
        -> Result<Vec<ScheduleEntryRef>>;

    async fn update_entry_duration(&self, entry_id: &str, duration_in_seconds: f64) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProgramsData {
    programs: ProgramNodes,
}

#[derive(Debug, Deserialize)]
struct ProgramNodes {
    nodes: Vec<ScheduleEntryRef>,
}

/// Client for the channel service's authenticated GraphQL API.
pub struct HttpScheduleService {
    client: reqwest::Client,
    graphql_url: String,
    token: Option<String>,
    retry: RetryConfig,
}

impl HttpScheduleService {
    pub fn new(client: reqwest::Client, graphql_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            graphql_url: normalize_base_url(graphql_url),
            token,
            retry: RetryConfig::propagation(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        query: &str,
        variables: Value,
    ) -> Result<T> {
        with_retry_if(
            &self.retry,
            operation_name,
            || async {
                let mut request = self.client.post(&self.graphql_url).json(&GraphQlRequest {
                    query,
                    variables: variables.clone(),
                });
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }

                let response = request
                    .send()
                    .await
                    .with_context(|| format!("Failed to send {} request", operation_name))?;

                let body: GraphQlResponse<T> = ensure_success(SERVICE, response)
                    .await?
                    .json()
                    .await
                    .with_context(|| format!("Failed to parse {} response", operation_name))?;

                if !body.errors.is_empty() {
                    return Err(GraphQlError {
                        service: SERVICE,
                        messages: body.errors.into_iter().map(|e| e.message).collect(),
                    }
                    .into());
                }

                body.data
                    .with_context(|| format!("{} response contained no data", operation_name))
            },
            is_retryable_error,
        )
        .await
        .map_err(|e: anyhow::Error| CatalogError::unavailable(SERVICE, format!("{:#}", e)))
    }
}

#[async_trait]
impl ScheduleService for HttpScheduleService {
    async fn find_entries(
        &self,
        entity_type: EntityKind,
        entity_id: &str,
    ) -> Result<Vec<ScheduleEntryRef>> {
        let data: ProgramsData = self
            .execute(
                "GetPrograms",
                FIND_PROGRAMS_QUERY,
                json!({ "entityId": entity_id, "entityType": entity_type.as_str() }),
            )
            .await?;
        Ok(data.programs.nodes)
    }

    async fn update_entry_duration(&self, entry_id: &str, duration_in_seconds: f64) -> Result<()> {
        let _: Value = self
            .execute(
                "UpdateProgram",
                UPDATE_PROGRAM_MUTATION,
                json!({
                    "id": entry_id,
                    "patch": { "videoDurationInSeconds": duration_in_seconds }
                }),
            )
            .await?;
        Ok(())
    }
}
