//! Gateway wire types — JSON bodies exchanged with chat clients

use cascade_core::Prompt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reply body for a rejected request
pub const INVALID_REQUEST: &str = "Invalid request";

/// Body of every `/api/chat` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    /// Set only when a provider answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ChatReply {
    pub fn answered(reply: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            provider: Some(provider.into()),
        }
    }

    pub fn message(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            provider: None,
        }
    }
}

/// `GET /api/health` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub providers: Vec<ProviderStatus>,
}

/// One provider in the chain, in priority order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub name: String,
    pub enabled: bool,
}

/// Extract the prompt from a `{"message": "..."}` body.
///
/// Anything that is not a JSON object with a non-blank string `message` is
/// rejected.
pub fn parse_chat_request(body: &[u8]) -> Option<Prompt> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = value.get("message")?.as_str()?;
    Prompt::new(message).ok()
}
