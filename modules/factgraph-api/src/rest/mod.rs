pub mod ingest;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;

use factgraph_common::FactGraphError;
use factgraph_graph::StoreError;

use crate::AppState;

pub use ingest::{api_load_dataset, api_process_post};

// --- Request bodies ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVerdictRequest {
    #[serde(alias = "post_id")]
    post_id: String,
    verdict: String,
    source: Option<String>,
}

// --- Helpers ---

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({"error": error, "message": message.into()})),
    )
        .into_response()
}

fn bad_request(err: FactGraphError) -> Response {
    error_response(StatusCode::BAD_REQUEST, "bad_request", err.to_string())
}

fn store_failure(err: &StoreError, what: &str) -> Response {
    warn!(error = %err, "{what}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", format!("{what}: {err}"))
}

fn not_found(message: &str, post_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"message": message, "postId": post_id})),
    )
        .into_response()
}

// --- Handlers ---

pub async fn api_post_graph(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.reader.fetch_subgraph(&id).await {
        Ok(graph) if graph.is_empty() => {
            not_found("Post not found or no graph data available.", &id)
        }
        Ok(graph) => Json(graph).into_response(),
        Err(e) => store_failure(&e, "Failed to retrieve graph data"),
    }
}

pub async fn api_post_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.reader.fetch_summary_and_verdict(&id).await {
        Ok(Some(summary)) => Json(summary).into_response(),
        Ok(None) => not_found("Summary or verdict not found for this post.", &id),
        Err(e) => store_failure(&e, "Failed to retrieve summary and verdict"),
    }
}

pub async fn api_update_verdict(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateVerdictRequest>,
) -> Response {
    if let Err(e) = validate_verdict(&body) {
        return bad_request(e);
    }

    match state
        .writer
        .update_verdict(&body.post_id, body.verdict.trim(), body.source.as_deref())
        .await
    {
        Ok(true) => Json(serde_json::json!({
            "status": "success",
            "message": format!("Verdict for post {} updated.", body.post_id),
        }))
        .into_response(),
        Ok(false) => not_found("Post not found.", &body.post_id),
        Err(e) => store_failure(&e, "Failed to update verdict"),
    }
}

fn validate_verdict(body: &UpdateVerdictRequest) -> Result<(), FactGraphError> {
    if body.post_id.trim().is_empty() {
        return Err(FactGraphError::Validation("postId must not be empty".into()));
    }
    if body.verdict.trim().is_empty() {
        return Err(FactGraphError::Validation("verdict must not be empty".into()));
    }
    Ok(())
}
