use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: String,
    /// Base URL of the OpenAI-compatible chat-completions API.
    /// Overridable so tests and self-hosted gateways can point elsewhere.
    pub llm_base_url: String,
    /// Directory containing the TTF files used for PDF reports.
    pub report_font_dir: String,
    /// Font family name within `report_font_dir` (e.g. `LiberationSans`
    /// expects `LiberationSans-Regular.ttf` and friends).
    pub report_font_family: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
            llm_base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            report_font_dir: std::env::var("REPORT_FONT_DIR")
                .unwrap_or_else(|_| "/usr/share/fonts/truetype/liberation".to_string()),
            report_font_family: std::env::var("REPORT_FONT_FAMILY")
                .unwrap_or_else(|_| "LiberationSans".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
