//! Tolerant parsing of loosely structured model replies.
//!
//! The collaborator promises JSON but delivers drift: markdown fences, smart
//! quotes, trailing commas, prose around the payload, a bare array instead of
//! an object, or `Q1`/`Q2`-keyed objects instead of a `questions` list. Every
//! recovery here returns a typed result-or-error; nothing throws into the
//! HTTP layer.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("reply contained no JSON")]
    NoJson,

    #[error("reply JSON had an unexpected shape: {0}")]
    UnexpectedShape(String),

    #[error("invalid JSON in reply: {0}")]
    Json(#[from] serde_json::Error),
}

fn fence_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^```(?:json)?\s*").expect("valid regex"))
}

fn fence_close_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```\s*$").expect("valid regex"))
}

fn control_char_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").expect("valid regex"))
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([}\]])").expect("valid regex"))
}

fn question_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[Qq](\d+)$").expect("valid regex"))
}

/// Cleans up the usual model-JSON damage: code fences, smart quotes,
/// control characters, stray backslashes, trailing commas.
pub fn clean_model_json(text: &str) -> String {
    let s = text.trim();
    let s = fence_open_re().replace(s, "");
    let s = fence_close_re().replace(&s, "");
    let s = s
        .replace('\u{201c}', "\"")
        .replace('\u{201d}', "\"")
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'");
    let s = control_char_re().replace_all(&s, " ");
    let s = escape_stray_backslashes(&s);
    trailing_comma_re().replace_all(&s, "$1").trim().to_string()
}

/// Doubles backslashes that do not start a valid JSON escape sequence.
fn escape_stray_backslashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next) if "\"\\/bfnrtu".contains(next) => {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                }
                _ => out.push_str("\\\\"),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// The outermost `{...}` or `[...]` span, for replies with prose around the
/// payload.
fn extract_json_span(text: &str) -> Option<&str> {
    let mut best: Option<(usize, usize)> = None;
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if end > start && best.map_or(true, |(s, _)| start < s) {
                best = Some((start, end));
            }
        }
    }
    best.map(|(start, end)| &text[start..=end])
}

/// Parses a model reply into `T`, cleaning first and falling back to the
/// outermost JSON span if the whole text does not parse.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let cleaned = clean_model_json(raw);
    match serde_json::from_str::<T>(&cleaned) {
        Ok(value) => Ok(value),
        Err(primary) => match extract_json_span(&cleaned) {
            Some(span) => serde_json::from_str::<T>(span).map_err(|_| ParseError::Json(primary)),
            None => Err(ParseError::NoJson),
        },
    }
}

/// A quiz reply before question-level normalization.
#[derive(Debug, Default)]
pub struct RawQuiz {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Vec<Value>,
}

/// Parses a quiz reply, accepting a `{title, questions}` object, a bare
/// array of questions, or a `Q1`/`Q2`-keyed object.
pub fn parse_quiz_reply(raw: &str) -> Result<RawQuiz, ParseError> {
    let value: Value = parse_json_reply(raw)?;
    quiz_from_value(value)
}

fn quiz_from_value(value: Value) -> Result<RawQuiz, ParseError> {
    match value {
        Value::Array(items) => Ok(RawQuiz {
            title: None,
            description: None,
            questions: items,
        }),
        Value::Object(mut map) => {
            let title = map
                .get("title")
                .and_then(Value::as_str)
                .map(str::to_string);
            let description = map
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string);

            if let Some(Value::Array(items)) = map.remove("questions") {
                return Ok(RawQuiz {
                    title,
                    description,
                    questions: items,
                });
            }

            // Q1/Q2/... keyed object → ordered list
            let mut keyed: Vec<(u32, Value)> = map
                .into_iter()
                .filter_map(|(key, value)| {
                    question_key_re()
                        .captures(&key)
                        .and_then(|c| c[1].parse::<u32>().ok())
                        .map(|n| (n, value))
                })
                .collect();
            if keyed.is_empty() {
                return Err(ParseError::UnexpectedShape(
                    "object carries neither 'questions' nor Q-numbered keys".to_string(),
                ));
            }
            keyed.sort_by_key(|(n, _)| *n);
            Ok(RawQuiz {
                title,
                description,
                questions: keyed.into_iter().map(|(_, v)| v).collect(),
            })
        }
        other => Err(ParseError::UnexpectedShape(format!(
            "expected object or array, got {other}"
        ))),
    }
}
