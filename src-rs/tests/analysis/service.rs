use crate::analysis::id::SequentialIdGenerator;
use crate::analysis::service::AnalysisService;
use crate::analysis::types::{ReadabilityLevel, SuggestionKind};
use crate::config::{AppConfig, DispatchConfig, ProviderConfig, ProviderTuning};
use crate::error::AnalyzerError;
use crate::llm::models::provider_base::ProviderRequest;
use crate::llm::utils::network::Transport;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Replays queued responses, then repeats `fallback` forever.
struct MockTransport {
    queued: Mutex<VecDeque<Result<String, AnalyzerError>>>,
    fallback: Result<String, AnalyzerError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockTransport {
    fn always(response: Result<String, AnalyzerError>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: response,
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn sequence(responses: Vec<Result<String, AnalyzerError>>, then: Result<String, AnalyzerError>) -> Self {
        let mock = Self::always(then);
        *mock.queued.lock().unwrap() = responses.into();
        mock
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> ProviderRequest {
        self.requests.lock().unwrap().last().cloned().expect("a request was sent")
    }
}

impl Transport for MockTransport {
    async fn post(&self, request: &ProviderRequest) -> Result<String, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let next = self.queued.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

fn openai_envelope(answer: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": answer}}]
    })
    .to_string()
}

fn analysis_answer() -> String {
    json!({
        "suggestions": [
            {"type": "clarity", "priority": "low", "message": "m1", "originalText": "o", "suggestedText": "s", "reason": "r"},
            {"id": "fixed", "type": "structure", "priority": "high", "message": "m2", "originalText": "o", "suggestedText": "s", "reason": "r"}
        ],
        "semanticTerms": [{"term": "fox", "category": "animal", "importance": 0.7, "context": ["quick fox"]}],
        "readabilityScore": {"score": 82, "level": "easy", "factors": ["short sentences"]},
        "summary": "Clear and concise."
    })
    .to_string()
}

fn provider(retries: u32, timeout_ms: u64) -> ProviderConfig {
    ProviderConfig::new("p1", "openai", "sk-test", "gpt-4o-mini").with_tuning(ProviderTuning {
        retry_attempts: retries,
        timeout_ms,
        ..ProviderTuning::default()
    })
}

fn service(mock: &MockTransport) -> AnalysisService<&MockTransport, SequentialIdGenerator> {
    AnalysisService::with_parts(mock, SequentialIdGenerator::new("id"), DispatchConfig::immediate())
}

fn server_error() -> Result<String, AnalyzerError> {
    Err(AnalyzerError::Transport {
        status: 503,
        body: "overloaded".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "The quick brown fox jumps over the lazy dog. It was quick.";

    #[tokio::test]
    async fn analyze_decodes_structured_answer() {
        let mock = MockTransport::always(Ok(openai_envelope(&analysis_answer())));
        let result = service(&mock).analyze(TEXT, &provider(0, 1000)).await.unwrap();

        assert_eq!(result.suggestions.len(), 2);
        assert_eq!(result.suggestions[0].id, "id-1");
        assert_eq!(result.suggestions[1].id, "fixed");
        assert_eq!(result.semantic_terms[0].id, "id-2");
        assert_eq!(result.readability_score.level, ReadabilityLevel::Easy);
        assert_eq!(result.summary, "Clear and concise.");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn analyze_sends_prompt_with_text() {
        let mock = MockTransport::always(Ok(openai_envelope("{}")));
        service(&mock).analyze(TEXT, &provider(0, 1000)).await.unwrap();

        let req = mock.last_request();
        assert_eq!(req.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(req.header("Authorization"), Some("Bearer sk-test"));
        let content = req.body["messages"][0]["content"].as_str().unwrap();
        assert!(content.contains("Text to analyze:"));
        assert!(content.ends_with(&format!("{}\n", TEXT)));
    }

    #[tokio::test]
    async fn non_json_answer_falls_back() {
        let mock = MockTransport::always(Ok(openai_envelope("Your writing is lovely!")));
        let result = service(&mock).analyze(TEXT, &provider(0, 1000)).await.unwrap();

        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].kind, SuggestionKind::Style);
        assert_eq!(result.summary, "Your writing is lovely!");
        assert!(result.semantic_terms.is_empty());
    }

    #[tokio::test]
    async fn unreadable_envelope_falls_back_with_empty_summary() {
        let mock = MockTransport::always(Ok("<html>proxy page</html>".to_string()));
        let result = service(&mock).analyze(TEXT, &provider(0, 1000)).await.unwrap();
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.summary, "");
    }

    #[tokio::test]
    async fn custom_without_base_url_never_reaches_transport() {
        let mock = MockTransport::always(Ok(openai_envelope("{}")));
        let custom = ProviderConfig::new("c", "custom", "k", "llama3");
        let err = service(&mock).analyze(TEXT, &custom).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Configuration(_)));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_kind_and_disabled_provider_are_rejected_up_front() {
        let mock = MockTransport::always(Ok(openai_envelope("{}")));
        let svc = service(&mock);

        let err = svc
            .analyze(TEXT, &ProviderConfig::new("b", "baidu", "k", "ernie"))
            .await
            .unwrap_err();
        assert_eq!(err, AnalyzerError::UnsupportedProviderType("baidu".to_string()));

        let mut disabled = provider(0, 1000);
        disabled.enabled = false;
        let err = svc.analyze(TEXT, &disabled).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Configuration(_)));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn retries_server_and_network_errors() {
        let mock = MockTransport::sequence(
            vec![server_error(), Err(AnalyzerError::network("connection reset"))],
            Ok(openai_envelope(&analysis_answer())),
        );
        let result = service(&mock).analyze(TEXT, &provider(3, 1000)).await.unwrap();
        assert_eq!(result.suggestions.len(), 2);
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_configured_retries() {
        let mock = MockTransport::always(server_error());
        let err = service(&mock).analyze(TEXT, &provider(2, 1000)).await.unwrap_err();
        assert_eq!(
            err,
            AnalyzerError::Transport {
                status: 503,
                body: "overloaded".to_string()
            }
        );
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let mock = MockTransport::always(Err(AnalyzerError::Transport {
            status: 401,
            body: "bad key".to_string(),
        }));
        let err = service(&mock).analyze(TEXT, &provider(3, 1000)).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Transport { status: 401, .. }));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn slow_transport_times_out_as_network_error() {
        let mock = MockTransport::always(Ok(openai_envelope("{}"))).delayed(Duration::from_millis(500));
        let err = service(&mock).analyze(TEXT, &provider(1, 20)).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(err, AnalyzerError::Network { timed_out: true, .. }));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn zero_timeout_waits_for_slow_transport() {
        let mock = MockTransport::always(Ok(openai_envelope(&analysis_answer())))
            .delayed(Duration::from_millis(50));
        let result = service(&mock).analyze(TEXT, &provider(0, 0)).await.unwrap();
        assert_eq!(result.summary, "Clear and concise.");
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn from_config_carries_dispatch_settings() {
        let registry = AppConfig::from_toml_str(
            r#"
            [dispatch]
            backoff_base_ms = 25
            backoff_max_ms = 100
            "#,
        )
        .unwrap();
        let svc = AnalysisService::from_config(&registry);
        assert_eq!(svc.dispatch_config(), &registry.dispatch);
        assert_eq!(AnalysisService::new().dispatch_config(), &DispatchConfig::default());
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_call() {
        let mock = MockTransport::always(Ok(openai_envelope("{}"))).delayed(Duration::from_secs(10));
        let svc = service(&mock);
        let token = CancellationToken::new();
        let p = provider(0, 60_000);

        let started = Instant::now();
        let (result, _) = tokio::join!(svc.analyze_with_cancel(TEXT, &p, &token), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        assert_eq!(result.unwrap_err(), AnalyzerError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits() {
        let mock = MockTransport::always(Ok(openai_envelope("{}")));
        let token = CancellationToken::new();
        token.cancel();
        let err = service(&mock)
            .analyze_with_cancel(TEXT, &provider(0, 1000), &token)
            .await
            .unwrap_err();
        assert_eq!(err, AnalyzerError::Cancelled);
    }

    #[tokio::test]
    async fn repeated_calls_differ_only_in_generated_ids() {
        let mock = MockTransport::always(Ok(openai_envelope(&analysis_answer())));
        let svc = service(&mock);
        let p = provider(0, 1000);

        let first = svc.analyze(TEXT, &p).await.unwrap();
        let second = svc.analyze(TEXT, &p).await.unwrap();

        assert_eq!(first.without_ids(), second.without_ids());
        assert_ne!(first.suggestions[0].id, second.suggestions[0].id);
        assert_eq!(first.suggestions[1].id, second.suggestions[1].id);
    }

    #[tokio::test]
    async fn concurrent_calls_do_not_interfere() {
        let mock = MockTransport::always(Ok(openai_envelope(&analysis_answer())))
            .delayed(Duration::from_millis(50));
        let svc = service(&mock);
        let a = provider(0, 5000);
        let b = ProviderConfig::new("p2", "claude", "ak", "claude-3-haiku");

        let (ra, rb) = tokio::join!(svc.analyze(TEXT, &a), svc.analyze("Another text.", &b));
        assert!(ra.is_ok());
        // The claude call reads the openai envelope as empty and falls back.
        assert_eq!(rb.unwrap().suggestions.len(), 1);
        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn analyze_active_resolves_registry_selection() {
        let mock = MockTransport::always(Ok(openai_envelope(&analysis_answer())));
        let svc = service(&mock);
        let mut registry = AppConfig {
            dispatch: DispatchConfig::immediate(),
            providers: vec![provider(0, 1000)],
            active_provider: None,
        };

        let err = svc.analyze_active(TEXT, &registry).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Configuration(_)));
        assert_eq!(mock.calls(), 0);

        registry.active_provider = Some("p1".to_string());
        assert!(svc.analyze_active(TEXT, &registry).await.is_ok());
    }

    #[tokio::test]
    async fn connection_test_accepts_any_answer() {
        let confirmed = MockTransport::always(Ok(openai_envelope("Connection successful!")));
        assert!(service(&confirmed).test_connection(&provider(0, 1000)).await);

        let chatty = MockTransport::always(Ok(openai_envelope("Hello there")));
        assert!(service(&chatty).test_connection(&provider(0, 1000)).await);

        let req = chatty.last_request();
        assert!(req.body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("Connection successful"));
    }

    #[tokio::test]
    async fn connection_test_reports_false_on_empty_or_failure() {
        let empty = MockTransport::always(Ok(openai_envelope("")));
        assert!(!service(&empty).test_connection(&provider(0, 1000)).await);

        let failing = MockTransport::always(server_error());
        assert!(!service(&failing).test_connection(&provider(3, 1000)).await);
        assert_eq!(failing.calls(), 1);

        let unsupported = ProviderConfig::new("x", "alibaba", "k", "qwen");
        assert!(!service(&empty).test_connection(&unsupported).await);
    }
}
