//! Provider-agnostic types shared by the adapters and the router

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::invoker::RequestDescriptor;
use crate::prompt::Prompt;

/// Wire protocol spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// `{model, messages, temperature, max_tokens}` with bearer auth
    ChatCompletion,
    /// `{inputs, parameters}` with bearer auth
    TextGeneration,
    /// `{contents, generationConfig}` with an `x-goog-api-key` header
    Gemini,
}

impl ProviderKind {
    /// Build the outbound request for `prompt`
    pub fn build_request(
        &self,
        spec: &ProviderSpec,
        credential: &str,
        prompt: &Prompt,
    ) -> RequestDescriptor {
        match self {
            Self::ChatCompletion => super::chat::build_request(spec, credential, prompt),
            Self::TextGeneration => super::generation::build_request(spec, credential, prompt),
            Self::Gemini => super::gemini::build_request(spec, credential, prompt),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChatCompletion => write!(f, "chat_completion"),
            Self::TextGeneration => write!(f, "text_generation"),
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

/// Static configuration of one provider, resolved once at startup
#[derive(Clone)]
pub struct ProviderSpec {
    /// Unique name, used for logs and reply attribution
    pub name: String,
    pub kind: ProviderKind,
    /// Endpoint URL; `{model}` is replaced with [`Self::model`]
    pub endpoint: String,
    pub model: String,
    /// API key. `None` keeps the provider in the chain but it never calls out.
    pub credential: Option<String>,
    pub timeout: Duration,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    /// Leading system message (chat completions only)
    pub system_prompt: Option<String>,
}

impl ProviderSpec {
    pub fn new(name: impl Into<String>, kind: ProviderKind, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            endpoint: endpoint.into(),
            model: String::new(),
            credential: None,
            timeout: Duration::from_secs(12),
            temperature: 0.3,
            max_tokens: None,
            system_prompt: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Whether a credential is present
    pub fn is_enabled(&self) -> bool {
        self.credential.is_some()
    }

    /// Endpoint with the model substituted in
    pub fn endpoint_url(&self) -> String {
        self.endpoint.replace("{model}", &self.model)
    }
}

impl std::fmt::Debug for ProviderSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

/// Classified result of one provider attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// No credential; nothing was sent
    Skipped,
    TimedOut,
    TransportError(String),
    HttpError { status: u16, snippet: String },
    /// 2xx, but no text could be extracted
    ParseFailure,
    Success(String),
}

impl ProviderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Short label for logs and attempt records
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::TimedOut => "timed_out",
            Self::TransportError(_) => "transport_error",
            Self::HttpError { .. } => "http_error",
            Self::ParseFailure => "parse_failure",
            Self::Success(_) => "success",
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Success(text) => Some(text),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped => write!(f, "skipped (no credential)"),
            Self::TimedOut => write!(f, "timed out"),
            Self::TransportError(detail) => write!(f, "transport error: {detail}"),
            Self::HttpError { status, snippet } => write!(f, "HTTP {status}: {snippet}"),
            Self::ParseFailure => write!(f, "no text in response"),
            Self::Success(text) => write!(f, "success ({} chars)", text.chars().count()),
        }
    }
}

/// One link in the fallback chain
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name used for logs and reply attribution
    fn name(&self) -> &str;

    /// Whether the provider can issue calls at all
    fn is_enabled(&self) -> bool {
        true
    }

    /// Try to answer `prompt`. Never fails; every problem is an outcome.
    async fn attempt(&self, prompt: &Prompt) -> ProviderOutcome;
}
