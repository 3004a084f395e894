use thiserror::Error;

/// Failures surfaced to callers of the analysis service.
///
/// Decode problems in the model's answer are not part of this enum: they are
/// absorbed by the fallback analyzer and never reach the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported provider type: {0}")]
    UnsupportedProviderType(String),

    #[error("Network error: {cause}")]
    Network { cause: String, timed_out: bool },

    #[error("API request failed: {status} {body}")]
    Transport { status: u16, body: String },

    #[error("Request cancelled")]
    Cancelled,
}

impl AnalyzerError {
    pub fn network(cause: impl Into<String>) -> Self {
        AnalyzerError::Network {
            cause: cause.into(),
            timed_out: false,
        }
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        AnalyzerError::Network {
            cause: format!("request timed out after {} ms", timeout_ms),
            timed_out: true,
        }
    }

    /// Network failures and 5xx responses may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalyzerError::Network { .. } => true,
            AnalyzerError::Transport { status, .. } => (500..600).contains(status),
            AnalyzerError::Configuration(_)
            | AnalyzerError::UnsupportedProviderType(_)
            | AnalyzerError::Cancelled => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AnalyzerError::Network { timed_out: true, .. })
    }
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(e: reqwest::Error) -> Self {
        AnalyzerError::Network {
            cause: e.to_string(),
            timed_out: e.is_timeout(),
        }
    }
}
