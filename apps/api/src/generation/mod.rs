//! Generators — turn raw input text plus options into structured study
//! artifacts via the remote collaborator.
//!
//! Shared contract: build instruction → call LLM → tolerant parse → write to
//! the Content Store. Entities are inserted only after the entire reply
//! parses, so a failed generation never leaves partial writes behind.

pub mod flashcards;
pub mod handlers;
pub mod notes;
pub mod parse;
pub mod prompts;
pub mod quizzes;

use crate::errors::AppError;

/// Upper bound on source text sent to the model, in characters.
pub const MAX_CONTENT_CHARS: usize = 20_000;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_INPUT_CHARS: usize = 50_000;

/// Collapses runs of whitespace and truncates to [`MAX_CONTENT_CHARS`]
/// before the text goes into a prompt.
pub fn preprocess_content(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_CONTENT_CHARS {
        collapsed.chars().take(MAX_CONTENT_CHARS).collect()
    } else {
        collapsed
    }
}

/// Word-boundary preview of a longer text, used for stored source excerpts.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let truncated: String = content.chars().take(max_chars).collect();
    let cut = truncated.rfind(' ').unwrap_or(truncated.len());
    format!("{}...", &truncated[..cut])
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Boundary validation for note input.
pub fn validate_note_input(title: &str, content: &str, category: &str) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if title.trim().is_empty() {
        errors.push("title is required");
    } else if title.trim().chars().count() > MAX_TITLE_CHARS {
        errors.push("title is too long (maximum 200 characters)");
    }

    if content.trim().is_empty() {
        errors.push("content is required");
    } else if content.trim().chars().count() > MAX_INPUT_CHARS {
        errors.push("content is too long (maximum 50,000 characters)");
    }

    if category.trim().is_empty() {
        errors.push("category is required");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors.join("; ")))
    }
}
