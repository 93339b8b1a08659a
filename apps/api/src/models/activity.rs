use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of study event a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    NoteCreated,
    FlashcardsGenerated,
    FlashcardReviewed,
    QuizGenerated,
    QuizAttempted,
    TextGraded,
}

/// Append-only study-activity record. The Progress Tracker derives all of
/// its aggregates from these; records are never updated or removed short of
/// a whole-session clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub subject: String,
    pub timestamp: DateTime<Utc>,
    /// Percent score in 0–100 where the event produced one.
    pub score: Option<f64>,
    pub duration_minutes: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub notes_created: u32,
    pub flashcards_studied: u32,
}

impl ActivityRecord {
    pub fn new(kind: ActivityKind, subject: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        ActivityRecord {
            id: Uuid::new_v4(),
            kind,
            subject: subject.into(),
            timestamp,
            score: None,
            duration_minutes: 0,
            questions_answered: 0,
            correct_answers: 0,
            notes_created: 0,
            flashcards_studied: 0,
        }
    }
}
