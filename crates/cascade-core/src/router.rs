//! Fallback router — tries providers in priority order until one answers
//!
//! Providers are visited strictly one after another: the first `Success`
//! ends the request and no later provider is touched. Every other outcome is
//! logged and recorded, then the next provider gets its turn. Nothing a single
//! provider reports ever reaches the caller; only the aggregate
//! [`OrchestrationResult::AllFailed`] does.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::invoker::Invoker;
use crate::prompt::Prompt;
use crate::providers::{HttpProvider, Provider, ProviderOutcome, ProviderSpec};

/// Final answer for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationResult {
    Success { text: String, provider: String },
    AllFailed,
}

impl OrchestrationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// What happened to one provider during a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub provider: String,
    pub outcome: &'static str,
    pub elapsed: Duration,
}

/// Progress of a single request through the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Pending,
    Trying(usize),
    Succeeded,
    AllFailed,
}

impl RouteState {
    /// First state for a chain of `chain_len` providers
    pub fn start(chain_len: usize) -> Self {
        if chain_len == 0 {
            Self::AllFailed
        } else {
            Self::Trying(0)
        }
    }

    /// Next state after the provider at the current index reported `outcome`
    pub fn advance(self, outcome: &ProviderOutcome, chain_len: usize) -> Self {
        match self {
            Self::Pending => Self::start(chain_len),
            Self::Trying(_) if outcome.is_success() => Self::Succeeded,
            Self::Trying(i) if i + 1 < chain_len => Self::Trying(i + 1),
            Self::Trying(_) => Self::AllFailed,
            terminal => terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::AllFailed)
    }
}

/// Ordered fallback chain, shared read-only by all requests
#[derive(Clone)]
pub struct FallbackRouter {
    providers: Vec<Arc<dyn Provider>>,
}

impl FallbackRouter {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self { providers }
    }

    /// Build a chain of [`HttpProvider`]s sharing one invoker
    pub fn from_specs(specs: Vec<ProviderSpec>, invoker: Arc<dyn Invoker>) -> Self {
        let providers = specs
            .into_iter()
            .map(|spec| {
                Arc::new(HttpProvider::new(Arc::new(spec), invoker.clone())) as Arc<dyn Provider>
            })
            .collect();
        Self::new(providers)
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Route `prompt` through the chain
    pub async fn route(&self, prompt: &Prompt) -> OrchestrationResult {
        self.route_traced(prompt).await.0
    }

    /// Route `prompt`, also returning a record of every provider visited
    pub async fn route_traced(
        &self,
        prompt: &Prompt,
    ) -> (OrchestrationResult, Vec<AttemptRecord>) {
        let span = info_span!("route", request_id = %Uuid::new_v4());
        self.run_chain(prompt).instrument(span).await
    }

    async fn run_chain(&self, prompt: &Prompt) -> (OrchestrationResult, Vec<AttemptRecord>) {
        let chain_len = self.providers.len();
        let mut attempts = Vec::with_capacity(chain_len);
        let mut state = RouteState::start(chain_len);

        while let RouteState::Trying(index) = state {
            let provider = &self.providers[index];
            let name = provider.name();

            if provider.is_enabled() {
                info!(provider = name, position = index, "Trying provider");
            }
            let started = Instant::now();
            let outcome = provider.attempt(prompt).await;
            let elapsed = started.elapsed();

            attempts.push(AttemptRecord {
                provider: name.to_string(),
                outcome: outcome.label(),
                elapsed,
            });
            log_outcome(name, &outcome, elapsed);

            state = state.advance(&outcome, chain_len);
            if let ProviderOutcome::Success(text) = outcome {
                debug_assert_eq!(state, RouteState::Succeeded);
                return (
                    OrchestrationResult::Success {
                        text,
                        provider: name.to_string(),
                    },
                    attempts,
                );
            }
        }

        warn!(tried = attempts.len(), "All providers failed");
        (OrchestrationResult::AllFailed, attempts)
    }
}

impl std::fmt::Debug for FallbackRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("FallbackRouter")
            .field("providers", &names)
            .finish()
    }
}

fn log_outcome(provider: &str, outcome: &ProviderOutcome, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match outcome {
        ProviderOutcome::Success(text) => info!(
            provider,
            elapsed_ms,
            chars = text.chars().count(),
            "Provider succeeded"
        ),
        ProviderOutcome::Skipped => debug!(provider, "Provider skipped (no API key)"),
        ProviderOutcome::HttpError { status, snippet } => warn!(
            provider,
            elapsed_ms,
            status = *status,
            body = %snippet,
            "Provider returned error status"
        ),
        ProviderOutcome::TransportError(detail) => warn!(
            provider,
            elapsed_ms,
            error = %detail,
            "Provider request failed"
        ),
        ProviderOutcome::TimedOut => warn!(provider, elapsed_ms, "Provider timed out"),
        ProviderOutcome::ParseFailure => {
            warn!(provider, elapsed_ms, "Provider returned no usable text")
        }
    }
}
