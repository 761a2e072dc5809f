use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json},
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::pipeline::handle_pipeline;
use crate::protocol::{PipelineRequestBody, PipelineResponseBody};

use super::AppState;
use super::host::database_from_host;

// POST /v2/pipeline, /v3/pipeline
pub(super) async fn host_pipeline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<PipelineResponseBody> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());
    let database = database_from_host(host);
    run(&state, &database, body).await
}

// POST /db/:database/v2/pipeline, /db/:database/v3/pipeline
pub(super) async fn path_pipeline(
    State(state): State<AppState>,
    Path(database): Path<String>,
    Json(body): Json<Value>,
) -> Json<PipelineResponseBody> {
    run(&state, &database, body).await
}

// Bad requests are reported per request by the handler; a body whose outer shape is wrong
// carries no requests to report on.
async fn run(state: &AppState, database: &str, body: Value) -> Json<PipelineResponseBody> {
    let body = serde_json::from_value::<PipelineRequestBody>(body).unwrap_or_else(|err| {
        warn!(database, error = %err, "pipeline body has no usable requests");
        PipelineRequestBody::default()
    });
    debug!(database, requests = body.requests.len(), "pipeline call");
    Json(handle_pipeline(&state.registry, database, body).await)
}

// GET /v2, /v3 and their /db/:database forms
pub(super) async fn version_probe() -> StatusCode {
    StatusCode::OK
}

// GET /health
pub(super) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}
