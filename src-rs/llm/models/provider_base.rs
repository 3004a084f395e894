use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Completion budget sent with every analysis request
pub const REQUEST_MAX_TOKENS: u32 = 1000;
/// Sampling temperature sent to chat-completions endpoints
pub const REQUEST_TEMPERATURE: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Transport-ready POST request
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl ProviderRequest {
    pub fn new(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Request shaping and answer extraction for one provider protocol.
pub trait ProviderClient: Send + Sync {
    fn build_request(&self, prompt: &str) -> ProviderRequest;

    /// Pulls the model's text out of a response envelope; missing fields yield "".
    fn extract_text(&self, envelope: &Value) -> String;
}

pub(crate) fn string_at<'a>(envelope: &'a Value, pointer: &str) -> Option<&'a str> {
    envelope.pointer(pointer).and_then(|v| v.as_str())
}
