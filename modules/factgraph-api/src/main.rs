use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use factgraph_common::Config;
use factgraph_graph::{migrate::migrate, GraphReader, GraphWriter};
use factgraph_ingest::{graph_client, Batcher, IngestDeps, IngestPipeline};

mod rest;

pub struct AppState {
    pub pipeline: IngestPipeline,
    pub batcher: Batcher,
    pub reader: GraphReader,
    pub writer: GraphWriter,
}

impl AppState {
    pub fn new(deps: &IngestDeps) -> Self {
        Self {
            pipeline: deps.pipeline(),
            batcher: deps.batcher(),
            reader: deps.reader(),
            writer: deps.writer(),
        }
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    let graph = Router::new()
        .route("/process-post", post(rest::api_process_post))
        .route("/load-dataset", post(rest::api_load_dataset))
        .route("/post-graph/{id}", get(rest::api_post_graph))
        .route("/post-summary/{id}", get(rest::api_post_summary))
        .route("/update-verdict", post(rest::api_update_verdict));

    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .nest("/api/graph", graph)
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("factgraph=info".parse()?))
        .init();

    let config = Config::from_env()?;

    let client = graph_client(&config);
    migrate(&client).await?;

    let deps = IngestDeps::from_config(&config, client);
    let app = build_router(Arc::new(AppState::new(&deps)));

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("factgraph API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
