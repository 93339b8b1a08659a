//! Axum route handlers for the Generation API: notes, flashcards, quizzes.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::flashcards::{generate_flashcards, FlashcardParams};
use crate::generation::notes::{generate_note, NoteParams};
use crate::generation::quizzes::{generate_quiz, QuizParams};
use crate::models::activity::{ActivityKind, ActivityRecord};
use crate::models::flashcard::{Flashcard, ReviewMark, ReviewOutcome};
use crate::models::note::{DetailLevel, Note, NoteType};
use crate::models::quiz::{Quiz, QuizKind};
use crate::models::Difficulty;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateNoteRequest {
    pub title: String,
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub note_type: NoteType,
    #[serde(default)]
    pub detail_level: DetailLevel,
}

#[derive(Debug, Deserialize)]
pub struct GenerateFlashcardsRequest {
    pub content: String,
    #[serde(default = "default_num_cards")]
    pub num_cards: usize,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuizRequest {
    pub content: String,
    #[serde(default)]
    pub kind: QuizKind,
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewFlashcardRequest {
    pub outcome: ReviewOutcome,
    #[serde(default)]
    pub duration_minutes: u32,
}

fn default_category() -> String {
    "General".to_string()
}

fn default_num_cards() -> usize {
    10
}

fn default_num_questions() -> usize {
    5
}

// ────────────────────────────────────────────────────────────────────────────
// Notes
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:sid/notes
pub async fn handle_generate_note(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GenerateNoteRequest>,
) -> Result<Json<Note>, AppError> {
    let note = generate_note(
        &state.store,
        &state.llm,
        session_id,
        NoteParams {
            title: request.title,
            content: request.content,
            category: request.category,
            note_type: request.note_type,
            detail_level: request.detail_level,
        },
    )
    .await?;
    Ok(Json(note))
}

/// GET /api/v1/sessions/:sid/notes
pub async fn handle_list_notes(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<Note>>, AppError> {
    let notes = state.store.read(session_id, |data| data.notes.clone())?;
    Ok(Json(notes))
}

/// DELETE /api/v1/sessions/:sid/notes/:id
pub async fn handle_delete_note(
    State(state): State<AppState>,
    Path((session_id, note_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let removed = state.store.write(session_id, |data| {
        let before = data.notes.len();
        data.notes.retain(|n| n.id != note_id);
        before != data.notes.len()
    })?;
    if !removed {
        return Err(AppError::NotFound(format!("Note {note_id} not found")));
    }
    Ok(Json(json!({ "deleted": true })))
}

// ────────────────────────────────────────────────────────────────────────────
// Flashcards
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:sid/flashcards
pub async fn handle_generate_flashcards(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GenerateFlashcardsRequest>,
) -> Result<Json<Vec<Flashcard>>, AppError> {
    let cards = generate_flashcards(
        &state.store,
        &state.llm,
        session_id,
        FlashcardParams {
            content: request.content,
            num_cards: request.num_cards,
            difficulty: request.difficulty,
            category: request.category,
        },
    )
    .await?;
    Ok(Json(cards))
}

/// GET /api/v1/sessions/:sid/flashcards
pub async fn handle_list_flashcards(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<Flashcard>>, AppError> {
    let cards = state
        .store
        .read(session_id, |data| data.flashcards.clone())?;
    Ok(Json(cards))
}

/// DELETE /api/v1/sessions/:sid/flashcards/:id
pub async fn handle_delete_flashcard(
    State(state): State<AppState>,
    Path((session_id, card_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let removed = state.store.write(session_id, |data| {
        let before = data.flashcards.len();
        data.flashcards.retain(|c| c.id != card_id);
        before != data.flashcards.len()
    })?;
    if !removed {
        return Err(AppError::NotFound(format!("Flashcard {card_id} not found")));
    }
    Ok(Json(json!({ "deleted": true })))
}

/// POST /api/v1/sessions/:sid/flashcards/:id/review
///
/// Records one pass/fail self-assessment: appends to the card's review
/// history, stamps `last_reviewed`, and writes an activity record.
pub async fn handle_review_flashcard(
    State(state): State<AppState>,
    Path((session_id, card_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ReviewFlashcardRequest>,
) -> Result<Json<Flashcard>, AppError> {
    let card = state.store.write(session_id, |data| {
        let reviewed_at = data.next_timestamp();
        let card = data
            .flashcards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| AppError::NotFound(format!("Flashcard {card_id} not found")))?;

        card.review_history.push(ReviewMark {
            outcome: request.outcome,
            at: reviewed_at,
        });
        card.last_reviewed = Some(reviewed_at);
        let snapshot = card.clone();

        let mut record =
            ActivityRecord::new(ActivityKind::FlashcardReviewed, snapshot.category.clone(), reviewed_at);
        record.flashcards_studied = 1;
        record.questions_answered = 1;
        record.correct_answers = u32::from(request.outcome == ReviewOutcome::Pass);
        record.duration_minutes = request.duration_minutes;
        data.activity.push(record);

        Ok::<_, AppError>(snapshot)
    })??;

    Ok(Json(card))
}

// ────────────────────────────────────────────────────────────────────────────
// Quizzes
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:sid/quizzes
pub async fn handle_generate_quiz(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GenerateQuizRequest>,
) -> Result<Json<Quiz>, AppError> {
    let quiz = generate_quiz(
        &state.store,
        &state.llm,
        session_id,
        QuizParams {
            content: request.content,
            kind: request.kind,
            num_questions: request.num_questions,
            difficulty: request.difficulty,
            subject: request.subject,
        },
    )
    .await?;
    Ok(Json(quiz))
}

/// GET /api/v1/sessions/:sid/quizzes
pub async fn handle_list_quizzes(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<Quiz>>, AppError> {
    let quizzes = state.store.read(session_id, |data| data.quizzes.clone())?;
    Ok(Json(quizzes))
}

/// GET /api/v1/sessions/:sid/quizzes/:id
pub async fn handle_get_quiz(
    State(state): State<AppState>,
    Path((session_id, quiz_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Quiz>, AppError> {
    let quiz = state
        .store
        .read(session_id, |data| {
            data.quizzes.iter().find(|q| q.id == quiz_id).cloned()
        })?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {quiz_id} not found")))?;
    Ok(Json(quiz))
}

/// DELETE /api/v1/sessions/:sid/quizzes/:id
///
/// Deletes the quiz and, with it, every attempt it embeds.
pub async fn handle_delete_quiz(
    State(state): State<AppState>,
    Path((session_id, quiz_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let removed = state.store.write(session_id, |data| {
        let before = data.quizzes.len();
        data.quizzes.retain(|q| q.id != quiz_id);
        before != data.quizzes.len()
    })?;
    if !removed {
        return Err(AppError::NotFound(format!("Quiz {quiz_id} not found")));
    }
    Ok(Json(json!({ "deleted": true })))
}
