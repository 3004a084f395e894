use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::analysis::id::{IdGenerator, RandomIdGenerator};
use crate::analysis::parser::parse_analysis;
use crate::analysis::prompts::{build_analysis_prompt, CONNECTION_CONFIRMATION, CONNECTION_TEST_PROMPT};
use crate::analysis::retry::RetryPolicy;
use crate::analysis::types::AnalysisResult;
use crate::config::{AppConfig, DispatchConfig, ProviderConfig};
use crate::error::AnalyzerError;
use crate::llm::models::provider_handle::{create_client, ProviderClient, ProviderRequest};
use crate::llm::utils::network::{HttpTransport, Transport};

/// Dispatches analysis requests to configured providers and normalizes the
/// answers. Holds no per-call state, so one instance serves concurrent calls.
pub struct AnalysisService<T = HttpTransport, G = RandomIdGenerator> {
    transport: T,
    ids: G,
    dispatch: DispatchConfig,
}

impl AnalysisService {
    pub fn new() -> Self {
        Self::with_parts(HttpTransport::new(), RandomIdGenerator, DispatchConfig::default())
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_parts(HttpTransport::new(), RandomIdGenerator, config.dispatch.clone())
    }
}

impl Default for AnalysisService {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport, G: IdGenerator> AnalysisService<T, G> {
    pub fn with_parts(transport: T, ids: G, dispatch: DispatchConfig) -> Self {
        Self {
            transport,
            ids,
            dispatch,
        }
    }

    pub fn dispatch_config(&self) -> &DispatchConfig {
        &self.dispatch
    }

    /// Analyzes `content` with the given provider.
    ///
    /// Fails only on configuration, network or HTTP errors; an answer that
    /// cannot be decoded yields the fallback analysis instead.
    pub async fn analyze(
        &self,
        content: &str,
        provider: &ProviderConfig,
    ) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze_with_cancel(content, provider, &CancellationToken::new())
            .await
    }

    /// Analyzes `content` with the registry's active provider.
    pub async fn analyze_active(
        &self,
        content: &str,
        config: &AppConfig,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let provider = config.active_provider()?;
        self.analyze(content, provider).await
    }

    /// Like [`analyze`](Self::analyze), aborting the in-flight request or
    /// backoff wait as soon as `cancel` fires.
    pub async fn analyze_with_cancel(
        &self,
        content: &str,
        provider: &ProviderConfig,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalyzerError> {
        if !provider.enabled {
            return Err(AnalyzerError::Configuration(format!(
                "AI provider '{}' is disabled",
                provider.id
            )));
        }

        let client = create_client(provider)?;
        let request = client.build_request(&build_analysis_prompt(content));
        let policy = RetryPolicy::new(&provider.tuning, &self.dispatch);

        log::info!(
            "Analyzing {} chars with provider '{}' ({}, model {})",
            content.chars().count(),
            provider.id,
            client.kind(),
            provider.model
        );

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Analysis with provider '{}' cancelled", provider.id);
                return Err(AnalyzerError::Cancelled);
            }
            res = self.send_with_retry(&request, provider, policy) => res?,
        };

        let answer = client.extract_from_body(&body);
        Ok(parse_analysis(content, &answer, &self.ids))
    }

    /// Sends the canary prompt once. Any failure counts as "not connected".
    pub async fn test_connection(&self, provider: &ProviderConfig) -> bool {
        match self.connection_answer(provider).await {
            Ok(answer) => {
                let confirmed = answer.to_lowercase().contains(CONNECTION_CONFIRMATION);
                if !confirmed && !answer.is_empty() {
                    log::info!(
                        "Provider '{}' answered the connection test without the confirmation phrase",
                        provider.id
                    );
                }
                confirmed || !answer.is_empty()
            }
            Err(e) => {
                log::error!("Connection test failed for provider '{}': {}", provider.id, e);
                false
            }
        }
    }

    async fn connection_answer(&self, provider: &ProviderConfig) -> Result<String, AnalyzerError> {
        let client = create_client(provider)?;
        let request = client.build_request(CONNECTION_TEST_PROMPT);
        let body = self.send_once(&request, provider.tuning.timeout()).await?;
        Ok(client.extract_from_body(&body))
    }

    /// One transport attempt bounded by `timeout` (zero disables the bound).
    async fn send_once(
        &self,
        request: &ProviderRequest,
        timeout: Duration,
    ) -> Result<String, AnalyzerError> {
        if timeout.is_zero() {
            return self.transport.post(request).await;
        }
        match tokio::time::timeout(timeout, self.transport.post(request)).await {
            Ok(res) => res,
            Err(_) => Err(AnalyzerError::timeout(timeout.as_millis() as u64)),
        }
    }

    async fn send_with_retry(
        &self,
        request: &ProviderRequest,
        provider: &ProviderConfig,
        policy: RetryPolicy,
    ) -> Result<String, AnalyzerError> {
        let total = policy.total_attempts();
        let mut attempt = 1u32;
        loop {
            log::debug!(
                "POST {} for provider '{}', attempt {}/{}",
                request.url,
                provider.id,
                attempt,
                total
            );
            match self.send_once(request, provider.tuning.timeout()).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < total => {
                    let delay = policy.backoff(attempt);
                    log::warn!(
                        "Attempt {}/{} for provider '{}' failed: {}; retrying in {:?}",
                        attempt,
                        total,
                        provider.id,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("AI request to provider '{}' failed: {}", provider.id, e);
                    return Err(e);
                }
            }
        }
    }
}
