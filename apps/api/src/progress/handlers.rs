//! Axum route handlers for the Progress API. Handlers clone the activity
//! log out of the store and hand it to the pure aggregation functions.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::progress::{
    chart_data, overview, recommendations, strengths_and_weaknesses, weekly_summary, ChartData,
    ProgressOverview, StrengthsAnalysis, WeeklySummary,
};
use crate::state::AppState;

/// GET /api/v1/sessions/:sid/progress
pub async fn handle_progress(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ProgressOverview>, AppError> {
    let records = state.store.read(session_id, |data| data.activity.clone())?;
    Ok(Json(overview(&records)))
}

/// GET /api/v1/sessions/:sid/progress/weekly
pub async fn handle_weekly(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<WeeklySummary>, AppError> {
    let records = state.store.read(session_id, |data| data.activity.clone())?;
    Ok(Json(weekly_summary(&records, Utc::now())))
}

/// GET /api/v1/sessions/:sid/progress/recommendations
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let records = state.store.read(session_id, |data| data.activity.clone())?;
    let analysis: StrengthsAnalysis = strengths_and_weaknesses(&records);
    let mut tips = recommendations(&records, Utc::now());
    tips.extend(analysis.recommendations.iter().cloned());
    Ok(Json(serde_json::json!({
        "strengths": analysis.strengths,
        "needs_improvement": analysis.needs_improvement,
        "recommendations": tips,
    })))
}

/// GET /api/v1/sessions/:sid/progress/charts
pub async fn handle_charts(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ChartData>, AppError> {
    let records = state.store.read(session_id, |data| data.activity.clone())?;
    Ok(Json(chart_data(&records)))
}
