use serde_json::{json, Value};

use crate::llm::models::provider_base::{
    string_at, ProviderClient, ProviderRequest, REQUEST_MAX_TOKENS,
};

/// Fields checked, in order, for the answer of a custom endpoint
const ANSWER_FIELDS: [&str; 3] = ["/response", "/content", "/text"];

/// Self-hosted or proxy endpoint taking a bare prompt.
#[derive(Debug, Clone)]
pub struct CustomClient {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

impl CustomClient {
    pub fn new(url: String, api_key: String, model: String) -> Self {
        Self { url, api_key, model }
    }
}

impl ProviderClient for CustomClient {
    fn build_request(&self, prompt: &str) -> ProviderRequest {
        let request_body = json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": REQUEST_MAX_TOKENS,
        });

        ProviderRequest::new(self.url.clone(), request_body)
            .with_header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn extract_text(&self, envelope: &Value) -> String {
        ANSWER_FIELDS
            .iter()
            .filter_map(|p| string_at(envelope, p))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}
