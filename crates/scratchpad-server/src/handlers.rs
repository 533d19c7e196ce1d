//! Request handlers for the note API.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use scratchpad_audit::CaptureHealth;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    #[serde(default)]
    pub folder: String,
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFolder {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveFile {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveFile {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteFile {
    #[serde(default)]
    pub path: String,
}

/// Unwrap a JSON body, mapping any rejection to `400 Bad request`.
fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::warn!(error = %rejection, "invalid request payload");
        ApiError::BadRequest
    })
}

// =============================================================================
// Folders
// =============================================================================

/// GET /folders
pub async fn list_folders(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    state.notes().list_folders().map(Json)
}

/// POST /folders
pub async fn create_folder(
    State(state): State<AppState>,
    body: Result<Json<CreateFolder>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let request = payload(body)?;
    if request.name.is_empty() {
        return Err(ApiError::BadRequest);
    }
    state.notes().create_folder(&request.name)?;
    Ok(StatusCode::CREATED)
}

// =============================================================================
// Files
// =============================================================================

/// GET /files?folder=
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    state.notes().list_files(&query.folder).map(Json)
}

/// GET /file?path=
pub async fn read_file(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let content = state.notes().read(&query.path)?;
    Ok(([(header::CONTENT_TYPE, "text/plain")], content))
}

/// POST /file/save
pub async fn save_file(
    State(state): State<AppState>,
    body: Result<Json<SaveFile>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let request = payload(body)?;
    if request.path.is_empty() {
        return Err(ApiError::BadRequest);
    }
    state.notes().save(&request.path, &request.content)?;
    Ok(StatusCode::OK)
}

/// POST /file/move
pub async fn move_file(
    State(state): State<AppState>,
    body: Result<Json<MoveFile>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let request = payload(body)?;
    if request.from.is_empty() || request.to.is_empty() {
        return Err(ApiError::BadRequest);
    }
    state.notes().rename(&request.from, &request.to)?;
    Ok(StatusCode::OK)
}

/// POST /file/delete
pub async fn delete_file(
    State(state): State<AppState>,
    body: Result<Json<DeleteFile>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let request = payload(body)?;
    if request.path.is_empty() {
        return Err(ApiError::BadRequest);
    }
    state.notes().delete(&request.path)?;
    Ok(StatusCode::OK)
}

// =============================================================================
// Service
// =============================================================================

/// GET /healthz
pub async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (audit, failures) = match state.audit().health() {
        CaptureHealth::Ok => ("ok", 0),
        CaptureHealth::Degraded { failures } => ("degraded", failures),
        CaptureHealth::Disabled => ("disabled", 0),
    };
    Json(json!({
        "ok": true,
        "service": "scratchpad",
        "audit": audit,
        "audit_failures": failures,
    }))
}

/// Fallback for a known route hit with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
