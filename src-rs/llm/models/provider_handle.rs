use serde_json::Value;

use crate::config::ProviderConfig;
use crate::cons::provider_cons::ProviderKind;
use crate::error::AnalyzerError;

use super::claude::ClaudeClient;
use super::custom::CustomClient;
use super::openai::OpenAiClient;
pub use super::provider_base::{ProviderClient, ProviderRequest};

pub enum AnyProviderClient {
    OpenAI(OpenAiClient),
    Claude(ClaudeClient),
    Custom(CustomClient),
}

impl AnyProviderClient {
    pub fn kind(&self) -> ProviderKind {
        match self {
            AnyProviderClient::OpenAI(_) => ProviderKind::OpenAI,
            AnyProviderClient::Claude(_) => ProviderKind::Claude,
            AnyProviderClient::Custom(_) => ProviderKind::Custom,
        }
    }

    /// Extracts the answer from a raw response body. A body that is not JSON
    /// behaves like an envelope without the answer field.
    pub fn extract_from_body(&self, body: &str) -> String {
        match serde_json::from_str::<Value>(body) {
            Ok(envelope) => self.extract_text(&envelope),
            Err(e) => {
                log::warn!("{} response body is not JSON: {}", self.kind(), e);
                String::new()
            }
        }
    }
}

impl ProviderClient for AnyProviderClient {
    fn build_request(&self, prompt: &str) -> ProviderRequest {
        match self {
            AnyProviderClient::OpenAI(c) => c.build_request(prompt),
            AnyProviderClient::Claude(c) => c.build_request(prompt),
            AnyProviderClient::Custom(c) => c.build_request(prompt),
        }
    }

    fn extract_text(&self, envelope: &Value) -> String {
        match self {
            AnyProviderClient::OpenAI(c) => c.extract_text(envelope),
            AnyProviderClient::Claude(c) => c.extract_text(envelope),
            AnyProviderClient::Custom(c) => c.extract_text(envelope),
        }
    }
}

/// Resolves a provider record to its protocol client, validating the parts of
/// the record the protocol depends on.
pub fn create_client(config: &ProviderConfig) -> Result<AnyProviderClient, AnalyzerError> {
    let kind = ProviderKind::from_name(&config.kind)
        .ok_or_else(|| AnalyzerError::UnsupportedProviderType(config.kind.clone()))?;

    let base_url = config.effective_base_url();
    if let Some(url) = base_url {
        validate_url(&config.id, url)?;
    }

    let api_key = config.api_key.clone();
    let model = config.model.clone();

    let client = match kind {
        ProviderKind::OpenAI => AnyProviderClient::OpenAI(OpenAiClient::new(base_url, api_key, model)),
        ProviderKind::Claude => AnyProviderClient::Claude(ClaudeClient::new(base_url, api_key, model)),
        ProviderKind::Custom => {
            let url = base_url.ok_or_else(|| {
                AnalyzerError::Configuration(format!(
                    "custom provider '{}' requires a base URL",
                    config.id
                ))
            })?;
            AnyProviderClient::Custom(CustomClient::new(url.to_string(), api_key, model))
        }
    };

    Ok(client)
}

fn validate_url(provider_id: &str, raw: &str) -> Result<(), AnalyzerError> {
    let parsed = url::Url::parse(raw).map_err(|e| {
        AnalyzerError::Configuration(format!(
            "provider '{}' has an invalid base URL '{}': {}",
            provider_id, raw, e
        ))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AnalyzerError::Configuration(format!(
            "provider '{}' base URL must use http or https, got '{}'",
            provider_id,
            parsed.scheme()
        )));
    }
    Ok(())
}
