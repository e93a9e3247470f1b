use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use factgraph_common::{BatchReport, FactGraphError, RawItem};
use factgraph_ingest::{prepare_dataset_items, IngestError};

use super::{bad_request, error_response, store_failure};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadDatasetRequest {
    #[serde(alias = "dataset_name")]
    dataset_name: String,
    #[serde(default = "default_split")]
    split: String,
    items: Vec<RawItem>,
}

fn default_split() -> String {
    "train".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadDatasetResponse {
    status: &'static str,
    #[serde(flatten)]
    report: BatchReport,
}

pub async fn api_process_post(
    State(state): State<Arc<AppState>>,
    Json(item): Json<RawItem>,
) -> Response {
    match state.pipeline.process_item(&item).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(IngestError::Store(e)) => store_failure(&e, "Failed to process post"),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            format!("Failed to process post: {e}"),
        ),
    }
}

pub async fn api_load_dataset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoadDatasetRequest>,
) -> Response {
    if let Err(e) = validate_load(&body) {
        return bad_request(e);
    }

    let items = prepare_dataset_items(&body.dataset_name, &body.split, body.items);
    info!(
        dataset = body.dataset_name.as_str(),
        split = body.split.as_str(),
        items = items.len(),
        "Loading dataset"
    );

    let report = state.batcher.ingest_batch(&items).await;
    Json(LoadDatasetResponse {
        status: "Dataset processing completed",
        report,
    })
    .into_response()
}

fn validate_load(body: &LoadDatasetRequest) -> Result<(), FactGraphError> {
    if body.dataset_name.trim().is_empty() {
        return Err(FactGraphError::Validation("datasetName must not be empty".into()));
    }
    if body.items.is_empty() {
        return Err(FactGraphError::Validation("items must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::{app, call, post_json};
    use super::*;
    use factgraph_ingest::testing::{MockExtractor, MockStore};
    use serde_json::json;

    #[tokio::test]
    async fn process_post_returns_outcome() {
        let store = Arc::new(MockStore::new());
        let (status, body) = call(
            app(store.clone(), MockExtractor::new()),
            post_json("/api/graph/process-post", json!({"id": "p1", "text": "hello #world"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"postId": "p1", "status": "success"}));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn process_post_without_text_is_error_outcome() {
        let store = Arc::new(MockStore::new());
        let (status, body) = call(
            app(store.clone(), MockExtractor::new()),
            post_json("/api/graph/process-post", json!({"id": "p1", "content": "wrong field"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn load_dataset_reports_batch() {
        let store = Arc::new(MockStore::new());
        let request = json!({
            "dataset_name": "org/health",
            "items": [
                {"inputs_pretokenized": "a", "targets_pretokenized": "true"},
                {"inputs_pretokenized": "b"},
                {"unrelated": 1},
            ],
        });
        let (status, body) = call(
            app(store.clone(), MockExtractor::new()),
            post_json("/api/graph/load-dataset", request),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Dataset processing completed");
        assert_eq!(body["totalItems"], 3);
        assert_eq!(body["succeeded"], 2);
        assert_eq!(body["failed"], 1);
        assert_eq!(
            body["sampleSucceededIds"],
            json!(["org_health_train_0", "org_health_train_1"])
        );
    }

    #[tokio::test]
    async fn load_dataset_rejects_empty_items() {
        let (status, _) = call(
            app(Arc::new(MockStore::new()), MockExtractor::new()),
            post_json("/api/graph/load-dataset", json!({"datasetName": "x", "items": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
