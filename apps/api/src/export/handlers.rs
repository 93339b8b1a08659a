//! Axum route handlers for flashcard CSV exchange and notes export.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{flashcards_from_csv, flashcards_to_csv, notes_to_text};
use crate::models::flashcard::Flashcard;
use crate::state::AppState;

/// GET /api/v1/sessions/:sid/flashcards/export
pub async fn handle_export_flashcards(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let cards = state
        .store
        .read(session_id, |data| data.flashcards.clone())?;
    if cards.is_empty() {
        return Err(AppError::Validation("No flashcards to export".to_string()));
    }
    let csv = flashcards_to_csv(&cards)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"flashcards.csv\"",
            ),
        ],
        Bytes::from(csv),
    ))
}

/// POST /api/v1/sessions/:sid/flashcards/import
///
/// Body is the raw CSV file. All records are validated before any card is
/// appended; imported cards get fresh ids and timestamps.
pub async fn handle_import_flashcards(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    body: String,
) -> Result<Json<serde_json::Value>, AppError> {
    let records = flashcards_from_csv(body.as_bytes())?;

    let imported = state.store.write(session_id, |data| {
        for record in &records {
            let created_at = data.next_timestamp();
            data.flashcards.push(Flashcard {
                id: Uuid::new_v4(),
                front: record.front.trim().to_string(),
                back: record.back.trim().to_string(),
                category: record.category.clone(),
                difficulty: record.difficulty,
                created_at,
                last_reviewed: None,
                review_history: vec![],
            });
        }
        records.len()
    })?;

    Ok(Json(json!({ "imported": imported })))
}

/// GET /api/v1/sessions/:sid/notes/export
pub async fn handle_export_notes(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let notes = state.store.read(session_id, |data| data.notes.clone())?;
    let text = notes_to_text(&notes, Utc::now());

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"study_notes.txt\"",
            ),
        ],
        text,
    ))
}
