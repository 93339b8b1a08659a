use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Difficulty;

/// Self-assessment outcome of one flashcard review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Pass,
    Fail,
}

/// One entry in a card's ordered review history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewMark {
    pub outcome: ReviewOutcome,
    pub at: DateTime<Utc>,
}

/// A generated flashcard. The prompt/answer pair is immutable; review state
/// is mutated by study-session self-assessment events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: Uuid,
    pub front: String,
    pub back: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub last_reviewed: Option<DateTime<Utc>>,
    /// Ordered pass/fail markers, oldest first.
    pub review_history: Vec<ReviewMark>,
}

impl Flashcard {
    /// Fraction of reviews passed, or `None` when the card was never reviewed.
    pub fn accuracy(&self) -> Option<f64> {
        if self.review_history.is_empty() {
            return None;
        }
        let passed = self
            .review_history
            .iter()
            .filter(|m| m.outcome == ReviewOutcome::Pass)
            .count();
        Some(passed as f64 / self.review_history.len() as f64)
    }
}
