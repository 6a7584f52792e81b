//! OpenAI-style chat completions (OpenRouter, Groq, and compatible servers)

use serde_json::{Value, json};

use super::types::ProviderSpec;
use crate::invoker::RequestDescriptor;
use crate::prompt::Prompt;

pub(crate) fn build_request(
    spec: &ProviderSpec,
    credential: &str,
    prompt: &Prompt,
) -> RequestDescriptor {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &spec.system_prompt {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.push(json!({"role": "user", "content": prompt.as_str()}));

    let mut body = json!({
        "model": spec.model,
        "messages": messages,
        "temperature": spec.temperature,
    });
    if let Some(max_tokens) = spec.max_tokens {
        body["max_tokens"] = Value::from(max_tokens);
    }

    RequestDescriptor::post_json(spec.endpoint_url(), body)
        .with_header("Authorization", format!("Bearer {credential}"))
}
