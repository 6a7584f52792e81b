//! Adapter that drives one configured provider over HTTP

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::types::{Provider, ProviderOutcome, ProviderSpec};
use crate::invoker::{InvokeError, Invoker};
use crate::normalize;
use crate::prompt::Prompt;

/// Maximum number of body characters kept in an [`ProviderOutcome::HttpError`]
const SNIPPET_CHARS: usize = 200;

/// A configured provider reached through a shared [`Invoker`]
#[derive(Clone)]
pub struct HttpProvider {
    spec: Arc<ProviderSpec>,
    invoker: Arc<dyn Invoker>,
}

impl HttpProvider {
    pub fn new(spec: Arc<ProviderSpec>, invoker: Arc<dyn Invoker>) -> Self {
        Self { spec, invoker }
    }

    pub fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    /// Parse a 2xx body and normalize it to text
    pub fn parse_response(&self, raw: &str) -> Option<String> {
        let body: Value = match serde_json::from_str(raw) {
            Ok(body) => body,
            Err(e) => {
                debug!(provider = %self.spec.name, error = %e, "Response body is not JSON");
                return None;
            }
        };

        let (shape, text) = normalize::classify(&body)?;
        debug!(provider = %self.spec.name, %shape, "Extracted response text");
        Some(text)
    }
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn is_enabled(&self) -> bool {
        self.spec.is_enabled()
    }

    async fn attempt(&self, prompt: &Prompt) -> ProviderOutcome {
        // No credential, no request: nothing is even built.
        let Some(credential) = self.spec.credential.as_deref() else {
            return ProviderOutcome::Skipped;
        };

        let request = self.spec.kind.build_request(&self.spec, credential, prompt);
        let response = match self.invoker.invoke(request, self.spec.timeout).await {
            Ok(response) => response,
            Err(InvokeError::Timeout(_)) => return ProviderOutcome::TimedOut,
            Err(InvokeError::Transport(detail)) => return ProviderOutcome::TransportError(detail),
        };

        if !response.is_success() {
            return ProviderOutcome::HttpError {
                status: response.status,
                snippet: snippet(&response.body),
            };
        }

        match self.parse_response(&response.body) {
            Some(text) => ProviderOutcome::Success(text),
            None => ProviderOutcome::ParseFailure,
        }
    }
}

fn snippet(body: &str) -> String {
    body.trim().chars().take(SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::{HttpInvoker, RawResponse, RequestDescriptor};
    use crate::providers::ProviderKind;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Invoker that records every request and replays a fixed result
    struct ScriptedInvoker {
        result: Result<RawResponse, InvokeError>,
        seen: Mutex<Vec<(RequestDescriptor, Duration)>>,
    }

    impl ScriptedInvoker {
        fn new(result: Result<RawResponse, InvokeError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn respond(status: u16, body: &str) -> Arc<Self> {
            Self::new(Ok(RawResponse {
                status,
                body: body.to_string(),
            }))
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Invoker for ScriptedInvoker {
        async fn invoke(
            &self,
            request: RequestDescriptor,
            timeout: Duration,
        ) -> Result<RawResponse, InvokeError> {
            self.seen.lock().unwrap().push((request, timeout));
            self.result.clone()
        }
    }

    fn chat_spec() -> ProviderSpec {
        ProviderSpec::new("Groq", ProviderKind::ChatCompletion, "https://groq.test/v1/chat")
            .with_model("llama3-70b-8192")
            .with_credential("gsk-test")
            .with_timeout(Duration::from_secs(7))
    }

    fn provider(spec: ProviderSpec, invoker: Arc<ScriptedInvoker>) -> HttpProvider {
        HttpProvider::new(Arc::new(spec), invoker)
    }

    fn prompt() -> Prompt {
        Prompt::new("hello?").unwrap()
    }

    #[tokio::test]
    async fn test_missing_credential_skips_without_invoking() {
        let invoker = ScriptedInvoker::respond(200, r#"{"generated_text":"never"}"#);
        let mut spec = chat_spec();
        spec.credential = None;
        let p = provider(spec, invoker.clone());

        assert_eq!(p.attempt(&prompt()).await, ProviderOutcome::Skipped);
        assert_eq!(invoker.calls(), 0);
        assert!(!p.is_enabled());
    }

    #[tokio::test]
    async fn test_success_uses_configured_timeout() {
        let invoker =
            ScriptedInvoker::respond(200, r#"{"choices":[{"message":{"content":" hello "}}]}"#);
        let p = provider(chat_spec(), invoker.clone());

        assert_eq!(
            p.attempt(&prompt()).await,
            ProviderOutcome::Success("hello".to_string())
        );
        let seen = invoker.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, Duration::from_secs(7));
        assert_eq!(seen[0].0.url, "https://groq.test/v1/chat");
        assert_eq!(seen[0].0.header("authorization"), Some("Bearer gsk-test"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let long_body = "x".repeat(500);
        let invoker = ScriptedInvoker::respond(500, &long_body);
        let p = provider(chat_spec(), invoker);

        match p.attempt(&prompt()).await {
            ProviderOutcome::HttpError { status, snippet } => {
                assert_eq!(status, 500);
                assert_eq!(snippet.len(), SNIPPET_CHARS);
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_with_text_body_is_still_http_error() {
        let invoker = ScriptedInvoker::respond(401, r#"{"error":"invalid api key"}"#);
        let p = provider(chat_spec(), invoker);

        assert_eq!(
            p.attempt(&prompt()).await,
            ProviderOutcome::HttpError {
                status: 401,
                snippet: r#"{"error":"invalid api key"}"#.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_failure() {
        let invoker = ScriptedInvoker::respond(200, "<html>gateway</html>");
        let p = provider(chat_spec(), invoker);
        assert_eq!(p.attempt(&prompt()).await, ProviderOutcome::ParseFailure);
    }

    #[tokio::test]
    async fn test_body_without_strings_is_parse_failure() {
        let invoker = ScriptedInvoker::respond(200, r#"{"scores":[1,2,3],"ok":true}"#);
        let p = provider(chat_spec(), invoker);
        assert_eq!(p.attempt(&prompt()).await, ProviderOutcome::ParseFailure);
    }

    #[tokio::test]
    async fn test_whitespace_longest_string_is_parse_failure() {
        let invoker = ScriptedInvoker::respond(200, r#"{"pad":"            ","id":"x1"}"#);
        let p = provider(chat_spec(), invoker);
        assert_eq!(p.attempt(&prompt()).await, ProviderOutcome::ParseFailure);
    }

    #[tokio::test]
    async fn test_invoker_errors_pass_through() {
        let timeout = ScriptedInvoker::new(Err(InvokeError::Timeout(Duration::from_secs(7))));
        let p = provider(chat_spec(), timeout);
        assert_eq!(p.attempt(&prompt()).await, ProviderOutcome::TimedOut);

        let refused = ScriptedInvoker::new(Err(InvokeError::Transport("refused".into())));
        let p = provider(chat_spec(), refused);
        assert_eq!(
            p.attempt(&prompt()).await,
            ProviderOutcome::TransportError("refused".to_string())
        );
    }

    #[tokio::test]
    async fn test_gemini_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "AIza-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "from gemini"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let spec = ProviderSpec::new(
            "Gemini",
            ProviderKind::Gemini,
            format!("{}/v1beta/models/{{model}}:generateContent", server.uri()),
        )
        .with_model("gemini-2.5-flash")
        .with_credential("AIza-test");
        let p = HttpProvider::new(Arc::new(spec), Arc::new(HttpInvoker::new()));

        assert_eq!(
            p.attempt(&prompt()).await,
            ProviderOutcome::Success("from gemini".to_string())
        );
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"generated_text": "late"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let spec = ProviderSpec::new("DeepInfra", ProviderKind::TextGeneration, server.uri())
            .with_credential("di-key")
            .with_timeout(Duration::from_millis(100));
        let p = HttpProvider::new(Arc::new(spec), Arc::new(HttpInvoker::new()));

        let started = std::time::Instant::now();
        assert_eq!(p.attempt(&prompt()).await, ProviderOutcome::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
