use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of study note to produce. Drives prompt construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    #[default]
    Summary,
    DetailedExplanation,
    KeyPoints,
    StudyGuide,
    Definitions,
    StudyQuestions,
    OrganizedContent,
    AnswerQuestions,
}

/// How much depth the generated notes should carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    Basic,
    #[default]
    Intermediate,
    Advanced,
}

/// A generated study note. Immutable once created; removed only by an
/// explicit user delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    /// Leading slice of the text the note was generated from.
    pub source_excerpt: String,
    pub body: String,
    pub category: String,
    pub note_type: NoteType,
    pub detail_level: DetailLevel,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
}
