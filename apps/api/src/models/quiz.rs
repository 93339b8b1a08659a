use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Difficulty;

/// Concrete question type carried by every generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    FillInBlank,
}

impl QuestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "Multiple Choice",
            QuestionKind::TrueFalse => "True/False",
            QuestionKind::ShortAnswer => "Short Answer",
            QuestionKind::FillInBlank => "Fill in the Blank",
        }
    }
}

/// What the user asked the generator for. `Mixed` fans out over the concrete
/// kinds with the weights the generator defines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizKind {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    FillInBlank,
    #[default]
    Mixed,
}

/// A single quiz question. `id` is 1-based and unique within its quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub prompt: String,
    pub kind: QuestionKind,
    /// Populated for multiple-choice; empty otherwise.
    pub options: Vec<String>,
    /// Canonical answer: an option letter or exact text, `True`/`False`,
    /// or the expected short answer.
    pub correct_answer: String,
    pub explanation: String,
    pub points: u32,
}

/// Per-question grading detail stored with an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: u32,
    pub prompt: String,
    pub submitted: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
    pub points_awarded: u32,
}

/// One graded (or grading-failed) submission against a quiz.
///
/// `score` is `None` when grading itself failed; the attempt is still
/// recorded, with `feedback` explaining what happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub submitted: HashMap<u32, String>,
    /// Percent score in 0–100, or `None` if grading failed.
    pub score: Option<f64>,
    pub correct_count: u32,
    pub total: u32,
    pub results: Vec<QuestionResult>,
    pub feedback: String,
    pub duration_minutes: u32,
    pub submitted_at: DateTime<Utc>,
}

/// A generated quiz with its attempts embedded. Deleting the quiz deletes
/// the attempts with it, so an attempt can never dangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub difficulty: Difficulty,
    pub kind: QuizKind,
    pub source_excerpt: String,
    pub questions: Vec<Question>,
    pub attempts: Vec<QuizAttempt>,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_kind_serde() {
        assert_eq!(
            serde_json::to_string(&QuestionKind::MultipleChoice).unwrap(),
            "\"multiple_choice\""
        );
        let k: QuestionKind = serde_json::from_str("\"fill_in_blank\"").unwrap();
        assert_eq!(k, QuestionKind::FillInBlank);
    }

    #[test]
    fn test_quiz_kind_default_is_mixed() {
        assert_eq!(QuizKind::default(), QuizKind::Mixed);
    }

    #[test]
    fn test_attempt_with_failed_grading_serializes_null_score() {
        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            submitted: HashMap::new(),
            score: None,
            correct_count: 0,
            total: 3,
            results: vec![],
            feedback: "Grading failed; answers were saved.".to_string(),
            duration_minutes: 0,
            submitted_at: Utc::now(),
        };
        let value = serde_json::to_value(&attempt).unwrap();
        assert!(value["score"].is_null());
        assert_eq!(value["total"], 3);
    }

    #[test]
    fn test_question_lookup_by_id() {
        let quiz = Quiz {
            id: Uuid::new_v4(),
            title: "Cell Biology".to_string(),
            description: String::new(),
            subject: "Biology".to_string(),
            difficulty: Difficulty::Medium,
            kind: QuizKind::TrueFalse,
            source_excerpt: String::new(),
            questions: vec![Question {
                id: 1,
                prompt: "Mitochondria produce ATP.".to_string(),
                kind: QuestionKind::TrueFalse,
                options: vec![],
                correct_answer: "True".to_string(),
                explanation: String::new(),
                points: 1,
            }],
            attempts: vec![],
            created_at: Utc::now(),
        };
        assert!(quiz.question(1).is_some());
        assert!(quiz.question(2).is_none());
    }
}
