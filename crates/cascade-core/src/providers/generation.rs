//! Text-generation inference endpoints (DeepInfra, Hugging Face)

use serde_json::{Value, json};

use super::types::ProviderSpec;
use crate::invoker::RequestDescriptor;
use crate::prompt::Prompt;

pub(crate) fn build_request(
    spec: &ProviderSpec,
    credential: &str,
    prompt: &Prompt,
) -> RequestDescriptor {
    let mut parameters = json!({"temperature": spec.temperature});
    if let Some(max_tokens) = spec.max_tokens {
        parameters["max_new_tokens"] = Value::from(max_tokens);
    }

    let body = json!({
        "inputs": prompt.as_str(),
        "parameters": parameters,
    });

    RequestDescriptor::post_json(spec.endpoint_url(), body)
        .with_header("Authorization", format!("Bearer {credential}"))
}
