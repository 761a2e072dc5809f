use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SqlEmulatorError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct CreateDatabase {
    name: String,
    #[serde(default)]
    group: Option<String>,
}

#[derive(Debug, Serialize)]
struct DatabaseJson {
    #[serde(rename = "DbId")]
    db_id: String,
    #[serde(rename = "Hostname")]
    hostname: String,
    #[serde(rename = "Name")]
    name: String,
}

impl DatabaseJson {
    fn new(state: &AppState, name: &str) -> Self {
        Self {
            db_id: name.to_string(),
            hostname: format!("{name}.{}", state.config.hostname_suffix),
            name: name.to_string(),
        }
    }
}

fn error_response(err: &SqlEmulatorError) -> Response {
    let status = match err {
        SqlEmulatorError::DatabaseExists(_) => StatusCode::CONFLICT,
        SqlEmulatorError::InvalidDatabaseName(_) => StatusCode::BAD_REQUEST,
        SqlEmulatorError::DatabaseNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(error = %err, "management request failed");
    }
    (status, Json(serde_json::json!({"error": err.to_string()}))).into_response()
}

// POST /v1/organizations/:org/databases
pub(super) async fn create_database(
    State(state): State<AppState>,
    Path(org): Path<String>,
    Json(req): Json<CreateDatabase>,
) -> Response {
    match state.registry.create(&req.name) {
        Ok(_) => {
            info!(org = %org, database = %req.name, group = ?req.group, "created database");
            Json(serde_json::json!({"database": DatabaseJson::new(&state, &req.name)}))
                .into_response()
        }
        Err(err) => error_response(&err),
    }
}

// GET /v1/organizations/:org/databases
pub(super) async fn list_databases(State(state): State<AppState>) -> Response {
    match state.registry.list() {
        Ok(names) => {
            let databases: Vec<DatabaseJson> = names
                .iter()
                .map(|name| DatabaseJson::new(&state, name))
                .collect();
            Json(serde_json::json!({"databases": databases})).into_response()
        }
        Err(err) => error_response(&err),
    }
}

// GET /v1/organizations/:org/databases/:database
pub(super) async fn get_database(
    State(state): State<AppState>,
    Path((_org, database)): Path<(String, String)>,
) -> Response {
    if state.registry.exists(&database) {
        Json(serde_json::json!({"database": DatabaseJson::new(&state, &database)})).into_response()
    } else {
        error_response(&SqlEmulatorError::DatabaseNotFound(database))
    }
}

// DELETE /v1/organizations/:org/databases/:database
pub(super) async fn delete_database(
    State(state): State<AppState>,
    Path((org, database)): Path<(String, String)>,
) -> Response {
    match state.registry.delete(&database) {
        Ok(removed) => {
            if removed {
                info!(org = %org, database = %database, "deleted database");
            }
            Json(serde_json::json!({"database": database})).into_response()
        }
        Err(err) => error_response(&err),
    }
}
