//! Session lifecycle handlers: create, delete, summary, clear, and the
//! whole-session JSON backup round trip.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::store::{SessionSnapshot, SessionSummary};

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> Json<CreateSessionResponse> {
    let session_id = state.store.create_session();
    tracing::info!("Created session {session_id}");
    Json(CreateSessionResponse { session_id })
}

/// DELETE /api/v1/sessions/:sid
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.store.remove_session(session_id) {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }
    Ok(Json(json!({ "deleted": true })))
}

/// GET /api/v1/sessions/:sid/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(state.store.summary(session_id)?))
}

/// POST /api/v1/sessions/:sid/clear
pub async fn handle_clear(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.store.clear(session_id)?;
    Ok(Json(json!({ "cleared": true })))
}

/// GET /api/v1/sessions/:sid/data — whole-session JSON backup.
pub async fn handle_export_data(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.store.snapshot(session_id)?))
}

/// POST /api/v1/sessions/:sid/data — restore a backup, replacing the
/// session's collections. An invalid snapshot imports nothing.
pub async fn handle_import_data(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(snapshot): Json<SessionSnapshot>,
) -> Result<Json<Value>, AppError> {
    state.store.import_snapshot(session_id, snapshot)?;
    Ok(Json(json!({ "imported": true })))
}
