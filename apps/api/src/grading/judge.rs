//! Short-answer judge — trait seam over the remote collaborator so grading
//! stays testable without an LLM.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::grading::prompts::{JUDGE_PROMPT_TEMPLATE, JUDGE_SYSTEM};
use crate::llm_client::{LlmClient, LlmOptions};

/// Decides whether a free-form answer matches the canonical one.
///
/// Carried in `AppState` as `Arc<dyn AnswerJudge>`.
#[async_trait]
pub trait AnswerJudge: Send + Sync {
    async fn is_correct(
        &self,
        question: &str,
        canonical: &str,
        submitted: &str,
    ) -> Result<bool, AppError>;
}

/// Default judge: asks the collaborator for a bare `true`/`false`.
pub struct LlmAnswerJudge {
    llm: LlmClient,
}

impl LlmAnswerJudge {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AnswerJudge for LlmAnswerJudge {
    async fn is_correct(
        &self,
        question: &str,
        canonical: &str,
        submitted: &str,
    ) -> Result<bool, AppError> {
        let prompt = JUDGE_PROMPT_TEMPLATE
            .replace("{question}", question)
            .replace("{correct_answer}", canonical)
            .replace("{submitted}", submitted);

        let reply = self
            .llm
            .chat(JUDGE_SYSTEM, &prompt, &LlmOptions::judge())
            .await
            .map_err(|e| AppError::Grading(format!("Short-answer judge call failed: {e}")))?;

        Ok(reply.trim().to_lowercase().starts_with('t'))
    }
}
