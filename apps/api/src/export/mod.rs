//! Flashcard exchange and plain-text notes export.
//!
//! Flashcards round-trip through CSV: one record per card with the
//! `(front, back, category, difficulty)` fields. Import validates every
//! record before anything is written — a file with one bad row imports
//! nothing.

pub mod handlers;

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::flashcard::Flashcard;
use crate::models::note::Note;
use crate::models::Difficulty;

/// One CSV record. Identical fields to [`Flashcard`]'s exchangeable core;
/// ids, timestamps, and review history are deliberately not exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvCard {
    pub front: String,
    pub back: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

fn default_category() -> String {
    "General".to_string()
}

impl From<&Flashcard> for CsvCard {
    fn from(card: &Flashcard) -> Self {
        CsvCard {
            front: card.front.clone(),
            back: card.back.clone(),
            category: card.category.clone(),
            difficulty: card.difficulty,
        }
    }
}

/// Serializes every card to CSV bytes.
pub fn flashcards_to_csv(cards: &[Flashcard]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for card in cards {
        writer
            .serialize(CsvCard::from(card))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV serialization failed: {e}")))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV serialization failed: {e}")))
}

/// Parses and validates a CSV file of flashcards. Any invalid record fails
/// the whole import.
pub fn flashcards_from_csv(bytes: &[u8]) -> Result<Vec<CsvCard>, AppError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut cards = Vec::new();

    for (index, record) in reader.deserialize::<CsvCard>().enumerate() {
        let row = index + 2; // 1-based, after the header row
        let card = record
            .map_err(|e| AppError::Validation(format!("Invalid flashcard file at row {row}: {e}")))?;
        if card.front.trim().is_empty() || card.back.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Invalid flashcard file at row {row}: front and back are required"
            )));
        }
        cards.push(card);
    }

    if cards.is_empty() {
        return Err(AppError::Validation(
            "The flashcard file contained no records".to_string(),
        ));
    }
    Ok(cards)
}

// ────────────────────────────────────────────────────────────────────────────
// Notes export
// ────────────────────────────────────────────────────────────────────────────

/// Plain-text export of all notes, grouped by category.
pub fn notes_to_text(notes: &[Note], exported_at: DateTime<Utc>) -> String {
    if notes.is_empty() {
        return "No notes to export.".to_string();
    }

    let mut out = String::new();
    out.push_str("Study Notes Export\n");
    out.push_str(&format!(
        "Exported on: {}\n",
        exported_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    let mut by_category: std::collections::BTreeMap<&str, Vec<&Note>> = Default::default();
    for note in notes {
        by_category.entry(&note.category).or_default().push(note);
    }

    for (category, group) in by_category {
        out.push_str(&format!("CATEGORY: {}\n", category.to_uppercase()));
        out.push_str(&"-".repeat(30));
        out.push_str("\n\n");

        for note in group {
            out.push_str(&format!("Title: {}\n", note.title));
            out.push_str(&format!("Created: {}\n", note.created_at.to_rfc3339()));
            out.push_str(&format!("Category: {}\n", note.category));
            out.push_str(&"-".repeat(20));
            out.push('\n');
            out.push_str(&note.body);
            out.push_str("\n\n");
            out.push_str(&"=".repeat(50));
            out.push_str("\n\n");
        }
    }

    out
}

/// Makes a string safe to suggest as a download filename.
pub fn sanitize_filename(name: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"));

    let cleaned = re.replace_all(name, "_");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ' ');
    let cleaned = if cleaned.is_empty() { "note" } else { cleaned };
    cleaned.chars().take(100).collect()
}
