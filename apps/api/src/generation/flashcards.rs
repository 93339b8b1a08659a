//! Flashcard generation — Q/A pairs parsed from a JSON-array reply.

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::parse;
use crate::generation::preprocess_content;
use crate::generation::prompts::{FLASHCARD_PROMPT_TEMPLATE, FLASHCARD_SYSTEM};
use crate::llm_client::{LlmClient, LlmOptions};
use crate::models::activity::{ActivityKind, ActivityRecord};
use crate::models::flashcard::Flashcard;
use crate::models::Difficulty;
use crate::store::SessionStore;

pub const MAX_CARDS: usize = 50;

#[derive(Debug, Clone)]
pub struct FlashcardParams {
    pub content: String,
    pub num_cards: usize,
    pub difficulty: Difficulty,
    /// Overrides the model-suggested category when set.
    pub category: Option<String>,
}

/// One card as the model returns it.
#[derive(Debug, Deserialize)]
struct RawCard {
    front: String,
    back: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

/// Generates flashcards and stores them. The reply must parse completely
/// before anything is written; a failure leaves the store unmodified.
pub async fn generate_flashcards(
    store: &SessionStore,
    llm: &LlmClient,
    session_id: Uuid,
    params: FlashcardParams,
) -> Result<Vec<Flashcard>, AppError> {
    if params.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }
    if params.num_cards == 0 || params.num_cards > MAX_CARDS {
        return Err(AppError::Validation(format!(
            "num_cards must be between 1 and {MAX_CARDS}"
        )));
    }
    store.read(session_id, |_| ())?;

    let content = preprocess_content(&params.content);
    let prompt = FLASHCARD_PROMPT_TEMPLATE
        .replace("{num_cards}", &params.num_cards.to_string())
        .replace("{difficulty}", params.difficulty.label())
        .replace("{content}", &content);

    let raw = llm
        .chat(FLASHCARD_SYSTEM, &prompt, &LlmOptions::generation())
        .await
        .map_err(|e| AppError::Generation(format!("Failed to generate flashcards: {e}")))?;

    let mut cards: Vec<RawCard> = parse::parse_json_reply(&raw)
        .map_err(|e| AppError::Generation(format!("Could not parse flashcards: {e}")))?;

    if cards.is_empty() {
        return Err(AppError::Generation(
            "The model returned no flashcards".to_string(),
        ));
    }
    if cards
        .iter()
        .any(|c| c.front.trim().is_empty() || c.back.trim().is_empty())
    {
        return Err(AppError::Generation(
            "The model returned a flashcard with an empty prompt or answer".to_string(),
        ));
    }
    if cards.len() > params.num_cards {
        warn!(
            "Model returned {} cards, keeping the requested {}",
            cards.len(),
            params.num_cards
        );
        cards.truncate(params.num_cards);
    }

    let created = store.write(session_id, |data| {
        let mut created = Vec::with_capacity(cards.len());
        for raw_card in &cards {
            let created_at = data.next_timestamp();
            let card = Flashcard {
                id: Uuid::new_v4(),
                front: raw_card.front.trim().to_string(),
                back: raw_card.back.trim().to_string(),
                category: params
                    .category
                    .clone()
                    .or_else(|| raw_card.category.clone())
                    .unwrap_or_else(|| "General".to_string()),
                difficulty: raw_card
                    .difficulty
                    .as_deref()
                    .and_then(Difficulty::parse_label)
                    .unwrap_or(params.difficulty),
                created_at,
                last_reviewed: None,
                review_history: vec![],
            };
            data.flashcards.push(card.clone());
            created.push(card);
        }

        let subject = created
            .first()
            .map(|c| c.category.clone())
            .unwrap_or_else(|| "General".to_string());
        let ts = data.next_timestamp();
        let record = ActivityRecord::new(ActivityKind::FlashcardsGenerated, subject, ts);
        data.activity.push(record);

        created
    })?;

    info!(
        "Generated {} flashcards in session {session_id}",
        created.len()
    );
    Ok(created)
}
