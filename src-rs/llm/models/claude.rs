use serde_json::{json, Value};

use crate::llm::models::provider_base::{
    string_at, Message, ProviderClient, ProviderRequest, REQUEST_MAX_TOKENS,
};

pub const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct ClaudeClient {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

impl ClaudeClient {
    pub fn new(base_url: Option<&str>, api_key: String, model: String) -> Self {
        Self {
            url: base_url.unwrap_or(ANTHROPIC_MESSAGES_URL).to_string(),
            api_key,
            model,
        }
    }
}

impl ProviderClient for ClaudeClient {
    fn build_request(&self, prompt: &str) -> ProviderRequest {
        let request_body = json!({
            "model": self.model,
            "max_tokens": REQUEST_MAX_TOKENS,
            "messages": [Message::user(prompt)],
        });

        ProviderRequest::new(self.url.clone(), request_body)
            .with_header("x-api-key", self.api_key.clone())
            .with_header("anthropic-version", ANTHROPIC_VERSION)
    }

    fn extract_text(&self, envelope: &Value) -> String {
        string_at(envelope, "/content/0/text")
            .unwrap_or_default()
            .to_string()
    }
}
