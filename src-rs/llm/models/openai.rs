use serde_json::{json, Value};

use crate::llm::models::provider_base::{
    string_at, Message, ProviderClient, ProviderRequest, REQUEST_MAX_TOKENS, REQUEST_TEMPERATURE,
};

pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, api_key: String, model: String) -> Self {
        Self {
            url: base_url.unwrap_or(OPENAI_CHAT_COMPLETIONS_URL).to_string(),
            api_key,
            model,
        }
    }
}

impl ProviderClient for OpenAiClient {
    fn build_request(&self, prompt: &str) -> ProviderRequest {
        ProviderRequest::new(
            self.url.clone(),
            build_chat_completions_request_body(&self.model, vec![Message::user(prompt)]),
        )
        .with_header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn extract_text(&self, envelope: &Value) -> String {
        string_at(envelope, "/choices/0/message/content")
            .unwrap_or_default()
            .to_string()
    }
}

fn build_chat_completions_request_body(model: &str, messages: Vec<Message>) -> Value {
    json!({
        "model": model,
        "messages": messages,
        "max_tokens": REQUEST_MAX_TOKENS,
        "temperature": REQUEST_TEMPERATURE,
    })
}
