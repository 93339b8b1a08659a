use std::sync::Arc;

use crate::config::Config;
use crate::grading::judge::AnswerJudge;
use crate::llm_client::LlmClient;
use crate::store::SessionStore;

/// Shared application state injected into all route handlers via Axum
/// extractors. The Content Store lives here — session-scoped state, not a
/// process-wide singleton.
#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub llm: LlmClient,
    /// Pluggable short-answer judge. Default: `LlmAnswerJudge`; tests swap
    /// in a local double.
    pub judge: Arc<dyn AnswerJudge>,
    pub config: Config,
}
