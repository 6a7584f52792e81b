//! cascade-core — sequential fallback across text-generation providers
//!
//! A prompt is offered to each configured provider in priority order until one
//! of them produces text. Every attempt runs under its own deadline, and the
//! heterogeneous JSON payloads providers return are normalized into plain
//! text before the router decides whether to stop or move on.

pub mod config;
pub mod invoker;
pub mod normalize;
pub mod prompt;
pub mod providers;
pub mod router;

pub use config::{CascadeConfig, GatewayConfig, ProviderConfig};
pub use invoker::{HttpInvoker, InvokeError, Invoker, RawResponse, RequestDescriptor};
pub use normalize::{ResponseShape, classify, extract_text};
pub use prompt::{Prompt, PromptError};
pub use providers::{HttpProvider, Provider, ProviderKind, ProviderOutcome, ProviderSpec};
pub use router::{AttemptRecord, FallbackRouter, OrchestrationResult, RouteState};
