use std::time::Duration;

use crate::error::AnalyzerError;
use crate::llm::models::provider_base::ProviderRequest;

/// Performs the network call for a built provider request.
///
/// Implementations return the raw response body on 2xx, `Transport` for any
/// other status and `Network` when no response was obtained. They never retry.
#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &ProviderRequest) -> Result<String, AnalyzerError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    /// Connection establishment bound; the per-call timeout is applied by the dispatcher.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self, AnalyzerError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { http_client })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    async fn post(&self, request: &ProviderRequest) -> Result<String, AnalyzerError> {
        let mut builder = self.http_client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.json(&request.body).send().await.map_err(|e| {
            log::debug!("POST {} failed before a response: {}", request.url, e);
            AnalyzerError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log::error!("LLM API error ({}) from {}", status, request.url);
            return Err(AnalyzerError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

impl<T: Transport> Transport for &T {
    async fn post(&self, request: &ProviderRequest) -> Result<String, AnalyzerError> {
        (**self).post(request).await
    }
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    async fn post(&self, request: &ProviderRequest) -> Result<String, AnalyzerError> {
        (**self).post(request).await
    }
}
