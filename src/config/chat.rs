use std::env;

const DEFAULT_SYSTEM_PROMPT: &str = "You are LunchLit's study assistant for high school \
students. Help with homework questions, study strategies, and school life. Keep answers \
concise and age-appropriate. Politely decline requests to write essays or assignments \
wholesale.";

/// Upstream AI provider settings for the chat proxy. The upstream speaks the
/// OpenAI-compatible chat-completions protocol.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub request_timeout_secs: u64,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("CHAT_UPSTREAM_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env::var("CHAT_API_KEY").unwrap_or_else(|_| "".to_string()),
            model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            system_prompt: env::var("CHAT_SYSTEM_PROMPT")
                .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string()),
            request_timeout_secs: env::var("CHAT_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
        }
    }

    /// The proxy refuses requests instead of forwarding unauthenticated
    /// calls upstream.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
