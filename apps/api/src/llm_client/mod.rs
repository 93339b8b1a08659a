/// LLM Client — the single point of entry for all remote text-generation
/// calls in Studyhall.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// All LLM interactions MUST go through this module.
///
/// Provider: any OpenAI-compatible chat-completions endpoint (OpenRouter by
/// default). The base URL is injected so tests can point at a mock server.
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

/// Model used for note and flashcard generation.
pub const NOTES_MODEL: &str = "deepseek/deepseek-chat";
/// Model used for quiz generation and grading.
pub const QUIZ_MODEL: &str = "anthropic/claude-3-haiku";

const REQUEST_TIMEOUT_SECS: u64 = 30;
/// One initial attempt plus at most a single retry.
const MAX_ATTEMPTS: u32 = 2;
const RETRY_DELAY_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Request failed after {attempts} attempts")]
    Retried { attempts: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Per-call knobs. Each caller picks the model and sampling that suits its
/// task (grading runs cold, generation runs warm).
#[derive(Debug, Clone)]
pub struct LlmOptions {
    pub model: &'static str,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmOptions {
    pub fn generation() -> Self {
        LlmOptions {
            model: NOTES_MODEL,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    pub fn quiz() -> Self {
        LlmOptions {
            model: QUIZ_MODEL,
            temperature: 0.5,
            max_tokens: 2000,
        }
    }

    pub fn grading() -> Self {
        LlmOptions {
            model: QUIZ_MODEL,
            temperature: 0.4,
            max_tokens: 1000,
        }
    }

    pub fn judge() -> Self {
        LlmOptions {
            model: QUIZ_MODEL,
            temperature: 0.0,
            max_tokens: 3,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The single LLM client used by all components.
/// Wraps the chat-completions API with a bounded timeout and a single retry.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Sends one system+user exchange and returns the assistant's text.
    /// Retries once on 429, 5xx, and transport errors.
    pub async fn chat(
        &self,
        system: &str,
        prompt: &str,
        opts: &LlmOptions,
    ) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model: opts.model,
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                warn!("LLM call failed, retrying once after {RETRY_DELAY_MS}ms...");
                tokio::time::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS)).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Try to parse the provider's error envelope
                let message = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let chat_response: ChatResponse = response.json().await?;

            if let Some(usage) = &chat_response.usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            let text = chat_response
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .ok_or(LlmError::EmptyContent)?;

            return Ok(text);
        }

        Err(last_error.unwrap_or(LlmError::Retried {
            attempts: MAX_ATTEMPTS,
        }))
    }

    /// Convenience method that calls the LLM and deserializes the reply as
    /// JSON after stripping markdown code fences. Callers needing more
    /// tolerance use `generation::parse` on the raw text instead.
    pub async fn chat_json<T: DeserializeOwned>(
        &self,
        system: &str,
        prompt: &str,
        opts: &LlmOptions,
    ) -> Result<T, LlmError> {
        let text = self.chat(system, prompt, opts).await?;
        let text = strip_json_fences(&text);
        serde_json::from_str(text).map_err(LlmError::Parse)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_body(content: &str) -> serde_json::Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        })
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[tokio::test]
    async fn test_chat_returns_assistant_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Hello there")))
            .mount(&server)
            .await;

        let client = LlmClient::new("test-key".to_string(), server.uri());
        let text = client
            .chat("system", "prompt", &LlmOptions::generation())
            .await
            .unwrap();
        assert_eq!(text, "Hello there");
    }

    #[tokio::test]
    async fn test_chat_retries_exactly_once_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(2) // initial attempt + one retry, no more
            .mount(&server)
            .await;

        let client = LlmClient::new("test-key".to_string(), server.uri());
        let result = client
            .chat("system", "prompt", &LlmOptions::grading())
            .await;
        assert!(matches!(result, Err(LlmError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_chat_does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "invalid api key"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new("bad-key".to_string(), server.uri());
        let result = client.chat("system", "prompt", &LlmOptions::quiz()).await;
        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_chat_json_strips_fences() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body("```json\n{\"score\": 7}\n```")),
            )
            .mount(&server)
            .await;

        #[derive(Deserialize)]
        struct Score {
            score: u32,
        }

        let client = LlmClient::new("test-key".to_string(), server.uri());
        let parsed: Score = client
            .chat_json("system", "prompt", &LlmOptions::grading())
            .await
            .unwrap();
        assert_eq!(parsed.score, 7);
    }

    #[tokio::test]
    async fn test_empty_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("   ")))
            .mount(&server)
            .await;

        let client = LlmClient::new("test-key".to_string(), server.uri());
        let result = client
            .chat("system", "prompt", &LlmOptions::generation())
            .await;
        assert!(matches!(result, Err(LlmError::EmptyContent)));
    }
}
