use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::SurgeonError;
use crate::model::{
    ActionItems, ExportResult, IngestInput, PipelineReport, RepoAnalysis, RepoContext,
    StructuredOutput,
};

use super::error::ApiError;
use super::AppState;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn ingest(State(state): State<AppState>, body: Bytes) -> ApiResult<RepoAnalysis> {
    let input: IngestInput = parse_body(&body)?;
    Ok(Json(state.pipeline.ingest.run(&input).await?))
}

pub async fn generate_actions(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<ActionItems> {
    let body: Value = parse_body(&body)?;
    let analysis = body
        .get("analysis")
        .filter(|analysis| !analysis.is_null())
        .ok_or_else(|| missing("analysis"))?;
    let analysis: RepoAnalysis = from_value(analysis.clone())?;

    Ok(Json(state.pipeline.actions.run(&analysis).await?))
}

pub async fn structure(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<StructuredOutput> {
    let body: Value = parse_body(&body)?;
    let has_actions = body
        .get("actions")
        .and_then(Value::as_str)
        .is_some_and(|actions| !actions.trim().is_empty());
    if !has_actions {
        return Err(missing("actions"));
    }
    let actions: ActionItems = from_value(body)?;

    Ok(Json(state.pipeline.structure.run(&actions).await?))
}

/// Accepts a bare `StructuredOutput` or `{structured, repoContext?}`.
pub async fn export(State(state): State<AppState>, body: Bytes) -> ApiResult<ExportResult> {
    let mut body: Value = parse_body(&body)?;

    let (structured, repo_context) = if body.get("structured").is_some() {
        let structured = body["structured"].take();
        (structured, body.get_mut("repoContext").map(Value::take))
    } else {
        (body, None)
    };

    if !structured.get("tickets").is_some_and(Value::is_array) {
        return Err(missing("tickets"));
    }
    let structured: StructuredOutput = from_value(structured)?;
    let repo_context: Option<RepoContext> = match repo_context {
        Some(context) if !context.is_null() => Some(from_value(context)?),
        _ => None,
    };

    Ok(Json(
        state
            .pipeline
            .export
            .run(&structured, repo_context.as_ref())
            .await,
    ))
}

pub async fn pipeline(State(state): State<AppState>, body: Bytes) -> ApiResult<PipelineReport> {
    let input: IngestInput = parse_body(&body)?;
    Ok(Json(state.pipeline.run(&input).await?))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| SurgeonError::InvalidInput(format!("Invalid JSON body: {e}")).into())
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| SurgeonError::InvalidInput(format!("Invalid payload: {e}")).into())
}

fn missing(what: &str) -> ApiError {
    SurgeonError::InvalidInput(format!("Missing {what} payload")).into()
}
