//! Axum route handlers for the Grading API.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::grading::{grade_submission, grade_text, TextGrade};
use crate::models::activity::{ActivityKind, ActivityRecord};
use crate::models::quiz::QuizAttempt;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    /// Question id → submitted answer text.
    pub answers: HashMap<u32, String>,
    #[serde(default)]
    pub duration_minutes: u32,
}

#[derive(Debug, Deserialize)]
pub struct GradeTextRequest {
    pub content: String,
    #[serde(default = "default_text_type")]
    pub text_type: String,
    #[serde(default)]
    pub extra_notes: String,
}

fn default_text_type() -> String {
    "essay".to_string()
}

/// POST /api/v1/sessions/:sid/quizzes/:id/attempts
///
/// Grades the submitted answers and appends an attempt to the quiz. If the
/// grading pipeline fails, the attempt is still recorded with a null score
/// and an explanatory note rather than being dropped.
pub async fn handle_submit_attempt(
    State(state): State<AppState>,
    Path((session_id, quiz_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SubmitAttemptRequest>,
) -> Result<Json<QuizAttempt>, AppError> {
    // Clone the quiz out so the lock is not held across the judge's await.
    let quiz = state
        .store
        .read(session_id, |data| {
            data.quizzes.iter().find(|q| q.id == quiz_id).cloned()
        })?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {quiz_id} not found")))?;

    let graded = grade_submission(&quiz, &request.answers, state.judge.as_ref()).await;

    let (score, correct_count, total, results, feedback) = match graded {
        Ok(g) => (Some(g.score), g.correct_count, g.total, g.results, g.feedback),
        Err(e) => {
            warn!("Grading failed for quiz {quiz_id}: {e}");
            (
                None,
                0,
                quiz.questions.len() as u32,
                vec![],
                format!(
                    "Automatic grading failed ({e}). Your answers were saved; \
                     submit them again to retry grading."
                ),
            )
        }
    };

    let attempt = state.store.write(session_id, |data| {
        let submitted_at = data.next_timestamp();
        let quiz = data
            .quizzes
            .iter_mut()
            .find(|q| q.id == quiz_id)
            .ok_or_else(|| AppError::NotFound(format!("Quiz {quiz_id} not found")))?;

        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            submitted: request.answers.clone(),
            score,
            correct_count,
            total,
            results,
            feedback,
            duration_minutes: request.duration_minutes,
            submitted_at,
        };
        quiz.attempts.push(attempt.clone());

        let subject = quiz.subject.clone();
        let mut record = ActivityRecord::new(ActivityKind::QuizAttempted, subject, submitted_at);
        record.score = score;
        record.questions_answered = total;
        record.correct_answers = correct_count;
        record.duration_minutes = request.duration_minutes;
        data.activity.push(record);

        Ok::<_, AppError>(attempt)
    })??;

    Ok(Json(attempt))
}

/// POST /api/v1/sessions/:sid/grade-text
///
/// Grades a piece of writing (essay, paragraph, report) and records the
/// event. The returned score is on the 0–10 rubric scale.
pub async fn handle_grade_text(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GradeTextRequest>,
) -> Result<Json<TextGrade>, AppError> {
    state.store.read(session_id, |_| ())?;

    let grade = grade_text(
        &state.llm,
        &request.content,
        &request.text_type,
        &request.extra_notes,
    )
    .await?;

    state.store.write(session_id, |data| {
        let ts = data.next_timestamp();
        let mut record = ActivityRecord::new(ActivityKind::TextGraded, "Writing", ts);
        // Rubric is 0–10; the activity log carries percent.
        record.score = Some(grade.score * 10.0);
        data.activity.push(record);
    })?;

    Ok(Json(grade))
}
