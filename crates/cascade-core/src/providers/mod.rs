//! Provider adapters
//!
//! Each configured provider is an [`HttpProvider`]: a [`ProviderSpec`] plus a
//! shared [`Invoker`](crate::invoker::Invoker). The request and response
//! conventions of the supported APIs are fixed per [`ProviderKind`]:
//! OpenAI-style chat completions, text-generation inference endpoints, and
//! Gemini's `generateContent`. The router only sees the [`Provider`] trait.

pub mod chat;
pub mod gemini;
pub mod generation;
pub mod http;
pub mod types;

pub use http::HttpProvider;
pub use types::{Provider, ProviderKind, ProviderOutcome, ProviderSpec};
