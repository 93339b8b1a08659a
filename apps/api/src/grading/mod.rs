//! Autograder — grades quiz submissions and free-text writing.
//!
//! Multiple-choice and true/false grade locally. Short answers try an exact
//! or containment match first, then fall back to the remote collaborator
//! through the [`AnswerJudge`] seam. A grading failure never drops the
//! attempt: the handler records it with a null score and an explanation.

pub mod handlers;
pub mod judge;
pub mod prompts;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::parse;
use crate::generation::quizzes::normalize_true_false;
use crate::grading::judge::AnswerJudge;
use crate::grading::prompts::{GRADE_TEXT_PROMPT_TEMPLATE, GRADE_TEXT_SYSTEM};
use crate::llm_client::{LlmClient, LlmOptions};
use crate::models::quiz::{Question, QuestionKind, QuestionResult, Quiz};

/// Upper bound on free-text submissions sent for grading, in characters.
pub const MAX_GRADING_CHARS: usize = 15_000;

/// Outcome of grading one whole submission.
#[derive(Debug, Clone)]
pub struct GradedSubmission {
    /// Percent score, always within 0–100.
    pub score: f64,
    pub correct_count: u32,
    pub total: u32,
    pub results: Vec<QuestionResult>,
    pub feedback: String,
}

/// Grades every question of a quiz against the submitted answers.
/// Unanswered questions count as incorrect.
pub async fn grade_submission(
    quiz: &Quiz,
    answers: &HashMap<u32, String>,
    judge: &dyn AnswerJudge,
) -> Result<GradedSubmission, AppError> {
    let mut results = Vec::with_capacity(quiz.questions.len());
    let mut correct_count = 0u32;

    for question in &quiz.questions {
        let submitted = answers
            .get(&question.id)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let is_correct = match &submitted {
            None => false,
            Some(answer) => grade_question(question, answer, judge).await?,
        };
        if is_correct {
            correct_count += 1;
        }

        results.push(QuestionResult {
            question_id: question.id,
            prompt: question.prompt.clone(),
            submitted,
            correct_answer: question.correct_answer.clone(),
            is_correct,
            explanation: question.explanation.clone(),
            points_awarded: if is_correct { question.points } else { 0 },
        });
    }

    let total = quiz.questions.len() as u32;
    let score = if total > 0 {
        f64::from(correct_count) / f64::from(total) * 100.0
    } else {
        0.0
    };

    Ok(GradedSubmission {
        score,
        correct_count,
        total,
        results,
        feedback: performance_feedback(score).to_string(),
    })
}

async fn grade_question(
    question: &Question,
    answer: &str,
    judge: &dyn AnswerJudge,
) -> Result<bool, AppError> {
    match question.kind {
        QuestionKind::MultipleChoice => Ok(compare_mc_answer(
            answer,
            &question.correct_answer,
            &question.options,
        )),
        QuestionKind::TrueFalse => Ok(compare_true_false(answer, &question.correct_answer)),
        QuestionKind::ShortAnswer | QuestionKind::FillInBlank => {
            let submitted = answer.trim().to_lowercase();
            let canonical = question.correct_answer.trim().to_lowercase();
            if !canonical.is_empty()
                && (submitted == canonical
                    || canonical.contains(&submitted)
                    || submitted.contains(&canonical))
            {
                return Ok(true);
            }
            judge
                .is_correct(&question.prompt, &question.correct_answer, answer)
                .await
        }
    }
}

/// Robust multiple-choice comparison: the submitted answer and the canonical
/// answer may each be an option letter, a `B) text` prefix, or exact option
/// text.
pub fn compare_mc_answer(user: &str, correct: &str, options: &[String]) -> bool {
    let user = user.trim();
    let correct = correct.trim();
    if options.is_empty() {
        return user.eq_ignore_ascii_case(correct);
    }

    let letter_of_text = |text: &str| {
        options
            .iter()
            .position(|o| o.trim().eq_ignore_ascii_case(text))
            .map(|i| (b'A' + i as u8) as char)
    };
    let resolve = |answer: &str| {
        single_letter(answer)
            .or_else(|| leading_letter(answer))
            .or_else(|| letter_of_text(answer))
    };

    match (resolve(user), resolve(correct)) {
        (Some(u), Some(c)) => u.eq_ignore_ascii_case(&c),
        _ => user.eq_ignore_ascii_case(correct),
    }
}

fn compare_true_false(user: &str, correct: &str) -> bool {
    match (normalize_true_false(user), normalize_true_false(correct)) {
        (Some(u), Some(c)) => u == c,
        _ => user.trim().eq_ignore_ascii_case(correct.trim()),
    }
}

fn single_letter(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
        _ => None,
    }
}

/// `B) Paris` / `b. Paris` → `b`. Requires the bracket or dot so a plain
/// word's first letter never counts as a choice.
fn leading_letter(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    matches!(chars.next(), Some(')') | Some('.')).then_some(first)
}

fn performance_feedback(score: f64) -> &'static str {
    if score >= 90.0 {
        "Outstanding performance! You've mastered this material."
    } else if score >= 80.0 {
        "Strong performance! You understand most concepts well."
    } else if score >= 70.0 {
        "Good effort. Review the questions you missed to improve."
    } else {
        "Needs improvement. Focus on the fundamentals and retake the quiz."
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Free-text grading
// ────────────────────────────────────────────────────────────────────────────

/// Structured feedback for a graded piece of writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGrade {
    /// 0–10, clamped.
    pub score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub detailed_feedback: String,
}

/// Grades a piece of writing via the remote collaborator.
pub async fn grade_text(
    llm: &LlmClient,
    content: &str,
    text_type: &str,
    extra_notes: &str,
) -> Result<TextGrade, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_GRADING_CHARS).collect();

    let prompt = GRADE_TEXT_PROMPT_TEMPLATE
        .replace("{text_type}", text_type)
        .replace("{extra_notes}", extra_notes)
        .replace("{content}", &truncated);

    let raw = llm
        .chat(GRADE_TEXT_SYSTEM, &prompt, &LlmOptions::grading())
        .await
        .map_err(|e| AppError::Grading(format!("Failed to grade {text_type}: {e}")))?;

    let mut grade: TextGrade = parse::parse_json_reply(&raw)
        .map_err(|e| AppError::Grading(format!("Could not parse grading reply: {e}")))?;
    grade.score = grade.score.clamp(0.0, 10.0);
    Ok(grade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::quiz::QuizKind;
    use crate::models::Difficulty;

    /// Judge double that never calls the network.
    struct FixedJudge(bool);

    #[async_trait]
    impl AnswerJudge for FixedJudge {
        async fn is_correct(
            &self,
            _question: &str,
            _canonical: &str,
            _submitted: &str,
        ) -> Result<bool, AppError> {
            Ok(self.0)
        }
    }

    /// Judge double that always fails, for the error-path contract.
    struct BrokenJudge;

    #[async_trait]
    impl AnswerJudge for BrokenJudge {
        async fn is_correct(
            &self,
            _question: &str,
            _canonical: &str,
            _submitted: &str,
        ) -> Result<bool, AppError> {
            Err(AppError::Grading("judge unavailable".to_string()))
        }
    }

    fn quiz(questions: Vec<Question>) -> Quiz {
        Quiz {
            id: Uuid::new_v4(),
            title: "Test Quiz".to_string(),
            description: String::new(),
            subject: "Biology".to_string(),
            difficulty: Difficulty::Medium,
            kind: QuizKind::Mixed,
            source_excerpt: String::new(),
            questions,
            attempts: vec![],
            created_at: Utc::now(),
        }
    }

    fn mc_question(id: u32) -> Question {
        Question {
            id,
            prompt: "Which planet is closest to the sun?".to_string(),
            kind: QuestionKind::MultipleChoice,
            options: vec![
                "A) Venus".to_string(),
                "B) Mercury".to_string(),
                "C) Mars".to_string(),
                "D) Earth".to_string(),
            ],
            correct_answer: "B".to_string(),
            explanation: String::new(),
            points: 1,
        }
    }

    fn short_question(id: u32) -> Question {
        Question {
            id,
            prompt: "Name the powerhouse of the cell.".to_string(),
            kind: QuestionKind::ShortAnswer,
            options: vec![],
            correct_answer: "Mitochondria".to_string(),
            explanation: String::new(),
            points: 1,
        }
    }

    #[tokio::test]
    async fn test_exact_match_earns_full_score() {
        let q = quiz(vec![mc_question(1), short_question(2)]);
        let answers = HashMap::from([
            (1, "B".to_string()),
            (2, "Mitochondria".to_string()),
        ]);
        let graded = grade_submission(&q, &answers, &FixedJudge(false))
            .await
            .unwrap();
        assert_eq!(graded.score, 100.0);
        assert_eq!(graded.correct_count, 2);
        assert!(graded.results.iter().all(|r| r.is_correct));
        assert_eq!(graded.results[0].points_awarded, 1);
    }

    #[tokio::test]
    async fn test_score_is_within_declared_range() {
        let q = quiz(vec![mc_question(1), mc_question(2), mc_question(3)]);
        let answers = HashMap::from([(1, "B".to_string()), (2, "A".to_string())]);
        let graded = grade_submission(&q, &answers, &FixedJudge(false))
            .await
            .unwrap();
        assert!(graded.score >= 0.0 && graded.score <= 100.0);
        assert!((graded.score - 100.0 / 3.0).abs() < 1e-6);
        assert_eq!(graded.correct_count, 1);
    }

    #[tokio::test]
    async fn test_unanswered_question_is_incorrect() {
        let q = quiz(vec![mc_question(1)]);
        let graded = grade_submission(&q, &HashMap::new(), &FixedJudge(true))
            .await
            .unwrap();
        assert_eq!(graded.score, 0.0);
        assert_eq!(graded.results[0].submitted, None);
    }

    #[tokio::test]
    async fn test_short_answer_falls_back_to_judge() {
        let q = quiz(vec![short_question(1)]);
        let answers = HashMap::from([(1, "the organelle that makes energy".to_string())]);

        let lenient = grade_submission(&q, &answers, &FixedJudge(true))
            .await
            .unwrap();
        assert_eq!(lenient.correct_count, 1);

        let strict = grade_submission(&q, &answers, &FixedJudge(false))
            .await
            .unwrap();
        assert_eq!(strict.correct_count, 0);
    }

    #[tokio::test]
    async fn test_judge_failure_propagates_for_caller_to_record() {
        let q = quiz(vec![short_question(1)]);
        let answers = HashMap::from([(1, "something else".to_string())]);
        let result = grade_submission(&q, &answers, &BrokenJudge).await;
        assert!(matches!(result, Err(AppError::Grading(_))));
    }

    #[test]
    fn test_compare_mc_letter_and_text_forms() {
        let options = vec![
            "A) Venus".to_string(),
            "B) Mercury".to_string(),
        ];
        assert!(compare_mc_answer("b", "B", &options));
        assert!(compare_mc_answer("B) Mercury", "B", &options));
        assert!(compare_mc_answer("B", "B) Mercury", &options));
        assert!(!compare_mc_answer("A", "B", &options));
        assert!(!compare_mc_answer("Venus", "B", &options));
    }

    #[test]
    fn test_compare_true_false_spellings() {
        assert!(compare_true_false("t", "True"));
        assert!(compare_true_false("YES", "true"));
        assert!(compare_true_false("0", "False"));
        assert!(!compare_true_false("true", "False"));
    }

    #[test]
    fn test_leading_letter_requires_delimiter() {
        assert_eq!(leading_letter("B) Mercury"), Some('B'));
        assert_eq!(leading_letter("b. Mercury"), Some('b'));
        assert_eq!(leading_letter("Mercury"), None);
    }

    #[test]
    fn test_feedback_tiers() {
        assert!(performance_feedback(95.0).contains("Outstanding"));
        assert!(performance_feedback(85.0).contains("Strong"));
        assert!(performance_feedback(72.0).contains("Good effort"));
        assert!(performance_feedback(40.0).contains("Needs improvement"));
    }
}
