//! Google Gemini `generateContent`

use serde_json::{Value, json};

use super::types::ProviderSpec;
use crate::invoker::RequestDescriptor;
use crate::prompt::Prompt;

pub(crate) fn build_request(
    spec: &ProviderSpec,
    credential: &str,
    prompt: &Prompt,
) -> RequestDescriptor {
    let mut generation_config = json!({"temperature": spec.temperature});
    if let Some(max_tokens) = spec.max_tokens {
        generation_config["maxOutputTokens"] = Value::from(max_tokens);
    }

    let body = json!({
        "contents": [{"parts": [{"text": prompt.as_str()}]}],
        "generationConfig": generation_config,
    });

    // Key goes in a header, never the query string.
    RequestDescriptor::post_json(spec.endpoint_url(), body)
        .with_header("x-goog-api-key", credential)
}
