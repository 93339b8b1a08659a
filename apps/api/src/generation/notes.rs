//! Note generation — free-text study notes from user input.

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::prompts::{build_note_prompt, NOTE_SYSTEM};
use crate::generation::{count_words, excerpt, preprocess_content, validate_note_input};
use crate::llm_client::{LlmClient, LlmOptions};
use crate::models::activity::{ActivityKind, ActivityRecord};
use crate::models::note::{DetailLevel, Note, NoteType};
use crate::store::SessionStore;

#[derive(Debug, Clone)]
pub struct NoteParams {
    pub title: String,
    pub content: String,
    pub category: String,
    pub note_type: NoteType,
    pub detail_level: DetailLevel,
}

/// Generates one note and stores it. On any failure the store is untouched.
pub async fn generate_note(
    store: &SessionStore,
    llm: &LlmClient,
    session_id: Uuid,
    params: NoteParams,
) -> Result<Note, AppError> {
    validate_note_input(&params.title, &params.content, &params.category)?;
    // Fail on an unknown session before paying for the remote call.
    store.read(session_id, |_| ())?;

    let content = preprocess_content(&params.content);
    let prompt = build_note_prompt(params.note_type, params.detail_level, &content);

    let body = llm
        .chat(NOTE_SYSTEM, &prompt, &LlmOptions::generation())
        .await
        .map_err(|e| AppError::Generation(format!("Failed to generate notes: {e}")))?;

    let note = store.write(session_id, |data| {
        let created_at = data.next_timestamp();
        let note = Note {
            id: Uuid::new_v4(),
            title: params.title.trim().to_string(),
            source_excerpt: excerpt(&content, 200),
            word_count: count_words(&body),
            body,
            category: params.category.trim().to_string(),
            note_type: params.note_type,
            detail_level: params.detail_level,
            created_at,
        };
        data.notes.push(note.clone());

        let mut record =
            ActivityRecord::new(ActivityKind::NoteCreated, note.category.clone(), created_at);
        record.notes_created = 1;
        data.activity.push(record);

        note
    })?;

    info!(
        "Generated note '{}' ({} words) in session {session_id}",
        note.title, note.word_count
    );
    Ok(note)
}
