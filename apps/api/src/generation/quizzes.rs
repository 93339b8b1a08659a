//! Quiz generation — normalizes a loosely structured model reply into typed
//! questions. Mixed mode issues one single-question request per slot with
//! weighted kinds.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::parse;
use crate::generation::preprocess_content;
use crate::generation::prompts::{build_quiz_prompt, QUIZ_SCHEMA_HEADER};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmOptions};
use crate::models::activity::{ActivityKind, ActivityRecord};
use crate::models::quiz::{Question, QuestionKind, Quiz, QuizKind};
use crate::models::Difficulty;
use crate::store::SessionStore;

pub const MAX_QUESTIONS: usize = 25;

/// Mixed-mode kind weights: multiple-choice, true/false, short-answer.
const MIXED_WEIGHTS: [(QuestionKind, f64); 3] = [
    (QuestionKind::MultipleChoice, 0.5),
    (QuestionKind::TrueFalse, 0.3),
    (QuestionKind::ShortAnswer, 0.2),
];

#[derive(Debug, Clone)]
pub struct QuizParams {
    pub content: String,
    pub kind: QuizKind,
    pub num_questions: usize,
    pub difficulty: Difficulty,
    pub subject: Option<String>,
}

/// Generates a quiz and stores it. Mixed mode fails as a whole if any
/// sub-request fails, so the store is never left with a partial quiz.
pub async fn generate_quiz(
    store: &SessionStore,
    llm: &LlmClient,
    session_id: Uuid,
    params: QuizParams,
) -> Result<Quiz, AppError> {
    if params.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }
    if params.num_questions == 0 || params.num_questions > MAX_QUESTIONS {
        return Err(AppError::Validation(format!(
            "num_questions must be between 1 and {MAX_QUESTIONS}"
        )));
    }
    store.read(session_id, |_| ())?;

    let content = preprocess_content(&params.content);
    let difficulty = params.difficulty.label();

    let (title, description, mut questions) = match params.kind {
        QuizKind::Mixed => (
            "Mixed Quiz".to_string(),
            None,
            generate_mixed(llm, &content, params.num_questions, difficulty).await?,
        ),
        concrete => {
            let kind = concrete_kind(concrete);
            let prompt = build_quiz_prompt(kind, params.num_questions, difficulty, &content);
            let raw = call_quiz_model(llm, &prompt).await?;
            let reply = parse::parse_quiz_reply(&raw)
                .map_err(|e| AppError::Generation(format!("Could not parse quiz: {e}")))?;
            let questions = reply
                .questions
                .iter()
                .filter_map(|value| normalize_question(value, kind))
                .collect::<Vec<_>>();
            (
                reply.title.unwrap_or_else(|| "Study Quiz".to_string()),
                reply.description,
                questions,
            )
        }
    };

    dedup_by_prompt(&mut questions);
    if questions.is_empty() {
        return Err(AppError::Generation(
            "The model returned no usable questions".to_string(),
        ));
    }
    if questions.len() > params.num_questions {
        questions.truncate(params.num_questions);
    }
    for (index, question) in questions.iter_mut().enumerate() {
        question.id = index as u32 + 1;
    }

    let quiz = store.write(session_id, |data| {
        let created_at = data.next_timestamp();
        let quiz = Quiz {
            id: Uuid::new_v4(),
            title,
            description: description.unwrap_or_else(|| "Test your knowledge".to_string()),
            subject: params
                .subject
                .clone()
                .unwrap_or_else(|| "General".to_string()),
            difficulty: params.difficulty,
            kind: params.kind,
            source_excerpt: crate::generation::excerpt(&content, 200),
            questions,
            attempts: vec![],
            created_at,
        };
        data.quizzes.push(quiz.clone());

        let record =
            ActivityRecord::new(ActivityKind::QuizGenerated, quiz.subject.clone(), created_at);
        data.activity.push(record);

        quiz
    })?;

    info!(
        "Generated quiz '{}' with {} questions in session {session_id}",
        quiz.title,
        quiz.questions.len()
    );
    Ok(quiz)
}

async fn call_quiz_model(llm: &LlmClient, prompt: &str) -> Result<String, AppError> {
    llm.chat(JSON_ONLY_INSTRUCTION, prompt, &LlmOptions::quiz())
        .await
        .map_err(|e| AppError::Generation(format!("Failed to generate quiz: {e}")))
}

/// One single-question request per slot, kind chosen by [`MIXED_WEIGHTS`].
async fn generate_mixed(
    llm: &LlmClient,
    content: &str,
    num_questions: usize,
    difficulty: &str,
) -> Result<Vec<Question>, AppError> {
    let mut questions = Vec::with_capacity(num_questions);
    for _ in 0..num_questions {
        let kind = pick_weighted_kind(rand::thread_rng().gen::<f64>());
        let prompt = build_quiz_prompt(kind, 1, difficulty, content);
        let raw = call_quiz_model(llm, &prompt).await?;
        let reply = parse::parse_quiz_reply(&raw)
            .map_err(|e| AppError::Generation(format!("Could not parse quiz: {e}")))?;
        match reply
            .questions
            .iter()
            .find_map(|value| normalize_question(value, kind))
        {
            Some(question) => questions.push(question),
            None => warn!("Mixed-quiz slot produced no usable question, skipping"),
        }
    }
    Ok(questions)
}

fn pick_weighted_kind(roll: f64) -> QuestionKind {
    let mut cumulative = 0.0;
    for (kind, weight) in MIXED_WEIGHTS {
        cumulative += weight;
        if roll < cumulative {
            return kind;
        }
    }
    QuestionKind::ShortAnswer
}

fn concrete_kind(kind: QuizKind) -> QuestionKind {
    match kind {
        QuizKind::MultipleChoice => QuestionKind::MultipleChoice,
        QuizKind::TrueFalse => QuestionKind::TrueFalse,
        QuizKind::ShortAnswer => QuestionKind::ShortAnswer,
        QuizKind::FillInBlank => QuestionKind::FillInBlank,
        QuizKind::Mixed => QuestionKind::ShortAnswer,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Question normalization
// ────────────────────────────────────────────────────────────────────────────

/// Coerces one raw question value into a typed [`Question`]. Returns `None`
/// for values with no usable prompt.
pub(crate) fn normalize_question(value: &Value, fallback: QuestionKind) -> Option<Question> {
    // A question serialized as a JSON string gets one re-parse attempt.
    let reparsed;
    let object = match value {
        Value::Object(map) => map,
        Value::String(s) => {
            reparsed = parse::parse_json_reply::<Value>(s).ok()?;
            reparsed.as_object()?
        }
        _ => return None,
    };

    let prompt = object
        .get("question")
        .or_else(|| object.get("prompt"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    let mut kind = object
        .get("type")
        .and_then(Value::as_str)
        .and_then(question_kind_from_str)
        .unwrap_or(fallback);

    let mut options: Vec<String> = object
        .get("options")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let explanation = object
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let mut correct = correct_answer_from(object);
    if correct.is_empty() && kind == QuestionKind::TrueFalse {
        correct = infer_true_false_from_text(&explanation).unwrap_or_default();
    }

    // "mixed" or unknown kinds resolve from the evidence the question carries.
    if object.get("type").and_then(Value::as_str) == Some("mixed") {
        kind = if !options.is_empty() {
            QuestionKind::MultipleChoice
        } else if normalize_true_false(&correct).is_some() {
            QuestionKind::TrueFalse
        } else {
            QuestionKind::ShortAnswer
        };
    }

    match kind {
        QuestionKind::TrueFalse => {
            if let Some(normalized) = normalize_true_false(&correct) {
                correct = normalized.to_string();
            }
            options.clear();
        }
        QuestionKind::MultipleChoice => {
            if options.is_empty() {
                options = extract_options_from_text(&prompt);
            }
            correct = normalize_mc_correct(&correct, &options);
        }
        QuestionKind::ShortAnswer | QuestionKind::FillInBlank => options.clear(),
    }

    let points = object
        .get("points")
        .and_then(Value::as_u64)
        .map(|p| p.clamp(1, 100) as u32)
        .unwrap_or(1);

    Some(Question {
        id: 0, // assigned after dedup
        prompt,
        kind,
        options,
        correct_answer: correct,
        explanation,
        points,
    })
}

fn correct_answer_from(object: &serde_json::Map<String, Value>) -> String {
    for key in [
        "correct_answer",
        "sample_answer",
        "expected_answer",
        "answer",
        "key_points",
    ] {
        match object.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
            Some(Value::Bool(b)) => return if *b { "True" } else { "False" }.to_string(),
            Some(Value::Number(n)) => return n.to_string(),
            Some(Value::Array(items)) => {
                let joined = items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("; ");
                if !joined.is_empty() {
                    return joined;
                }
            }
            _ => {}
        }
    }
    String::new()
}

fn question_kind_from_str(s: &str) -> Option<QuestionKind> {
    match s.trim().to_ascii_lowercase().as_str() {
        "multiple_choice" => Some(QuestionKind::MultipleChoice),
        "true_false" => Some(QuestionKind::TrueFalse),
        "short_answer" => Some(QuestionKind::ShortAnswer),
        "fill_in_blank" | "fill_blank" => Some(QuestionKind::FillInBlank),
        _ => None,
    }
}

/// Canonical `True`/`False` for the common spellings, `None` otherwise.
pub(crate) fn normalize_true_false(s: &str) -> Option<&'static str> {
    let lowered = s.trim().to_ascii_lowercase();
    let lowered = lowered
        .strip_prefix("a)")
        .or_else(|| lowered.strip_prefix("b)"))
        .unwrap_or(&lowered)
        .trim();
    match lowered {
        "true" | "t" | "yes" | "y" | "1" => Some("True"),
        "false" | "f" | "no" | "n" | "0" => Some("False"),
        _ => None,
    }
}

fn option_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)[A-D]\)\s*").expect("valid regex"))
}

/// Pulls `A) ...` style options embedded in question text: the text between
/// one option marker and the next (or a `;`/`|`/newline separator).
pub(crate) fn extract_options_from_text(text: &str) -> Vec<String> {
    let markers: Vec<(usize, usize)> = option_marker_re()
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    markers
        .iter()
        .enumerate()
        .filter_map(|(i, (_, end))| {
            let slice_end = markers.get(i + 1).map_or(text.len(), |(start, _)| *start);
            let option = text[*end..slice_end]
                .split(|c| c == ';' || c == '|' || c == '\n')
                .next()
                .unwrap_or("")
                .trim();
            (!option.is_empty()).then(|| option.to_string())
        })
        .collect()
}

/// Normalizes a multiple-choice correct answer to an option letter or the
/// exact option text.
pub(crate) fn normalize_mc_correct(correct: &str, options: &[String]) -> String {
    let c = correct.trim();
    let is_choice_letter = |ch: char| ('a'..='d').contains(&ch.to_ascii_lowercase());

    if c.len() == 1 && c.chars().next().is_some_and(is_choice_letter) {
        return c.to_ascii_uppercase();
    }
    for option in options {
        if c.eq_ignore_ascii_case(option.trim()) {
            return option.clone();
        }
    }
    if let Some(first) = c.chars().next() {
        if is_choice_letter(first)
            && matches!(c.chars().nth(1), Some(')') | Some('.') | Some(' ') | None)
        {
            return first.to_ascii_uppercase().to_string();
        }
    }
    c.to_string()
}

fn infer_true_false_from_text(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)\b(true|false)\b").expect("valid regex"));
    re.captures(text).map(|c| {
        let word = c[1].to_ascii_lowercase();
        if word == "true" { "True" } else { "False" }.to_string()
    })
}

fn dedup_by_prompt(questions: &mut Vec<Question>) {
    let mut seen = std::collections::HashSet::new();
    questions.retain(|q| seen.insert(q.prompt.clone()));
}
