//! Axum route handlers for the Report API. Responses are raw PDF bytes.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::report::{build_flashcard_report, build_progress_report};
use crate::state::AppState;

/// POST /api/v1/sessions/:sid/reports/progress
pub async fn handle_progress_report(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.store.read(session_id, |data| data.clone())?;
    let pdf = build_progress_report(
        &data,
        Utc::now(),
        &state.config.report_font_dir,
        &state.config.report_font_family,
    )?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"progress_report.pdf\"",
            ),
        ],
        pdf,
    ))
}

/// POST /api/v1/sessions/:sid/reports/flashcards
pub async fn handle_flashcard_report(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.store.read(session_id, |data| data.clone())?;
    let pdf = build_flashcard_report(
        &data,
        Utc::now(),
        &state.config.report_font_dir,
        &state.config.report_font_family,
    )?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"flashcard_report.pdf\"",
            ),
        ],
        pdf,
    ))
}
