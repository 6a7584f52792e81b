//! Response normalization — pull a plain-text answer out of any provider payload
//!
//! Providers disagree on where the generated text lives. Rather than trusting
//! the provider that produced a body, every payload is matched against the
//! known shapes in a fixed priority order, and when none of them match the
//! longest string anywhere in the document is taken as the answer.
//!
//! Matching is defensive: a missing or wrong-typed field is simply a
//! non-match. Every returned text is trimmed and non-empty.

use serde_json::Value;

/// Which rule produced the extracted text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `choices[0].message.content` as a string
    ChatMessage,
    /// `choices[0].message.content` as an array of parts
    ChatParts,
    /// `choices[0].text`
    ChoiceText,
    /// `[{"generated_text": ...}]`
    GenerationArray,
    /// `{"generated_text": ...}`
    GenerationDirect,
    /// `candidates[0].content.parts[].text`
    CandidateParts,
    /// `candidates[0].output`
    CandidateOutput,
    /// Longest string found by scanning the whole document
    LongestString,
}

impl std::fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ChatMessage => "chat_message",
            Self::ChatParts => "chat_parts",
            Self::ChoiceText => "choice_text",
            Self::GenerationArray => "generation_array",
            Self::GenerationDirect => "generation_direct",
            Self::CandidateParts => "candidate_parts",
            Self::CandidateOutput => "candidate_output",
            Self::LongestString => "longest_string",
        };
        f.write_str(name)
    }
}

/// Extract the most plausible answer text, if any
pub fn extract_text(body: &Value) -> Option<String> {
    classify(body).map(|(_, text)| text)
}

/// Like [`extract_text`], also reporting which shape matched
pub fn classify(body: &Value) -> Option<(ResponseShape, String)> {
    from_choices(body)
        .or_else(|| from_generation(body))
        .or_else(|| from_candidates(body))
        .or_else(|| longest_string(body).map(|text| (ResponseShape::LongestString, text)))
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn from_choices(body: &Value) -> Option<(ResponseShape, String)> {
    let choice = body.get("choices")?.get(0)?;
    // Some servers put the content straight on the choice.
    let message = match choice.get("message") {
        Some(Value::Null) | None => choice,
        Some(message) => message,
    };

    if let Some(text) = message.as_str().and_then(non_empty) {
        return Some((ResponseShape::ChatMessage, text));
    }

    match message.get("content") {
        Some(Value::String(content)) => {
            if let Some(text) = non_empty(content) {
                return Some((ResponseShape::ChatMessage, text));
            }
        }
        Some(Value::Array(parts)) => {
            let joined = parts.iter().map(part_text).collect::<Vec<_>>().join("\n");
            if let Some(text) = non_empty(&joined) {
                return Some((ResponseShape::ChatParts, text));
            }
        }
        _ => {}
    }

    choice
        .get("text")
        .and_then(Value::as_str)
        .and_then(non_empty)
        .map(|text| (ResponseShape::ChoiceText, text))
}

/// Text of one content part: its own `text`, else its nested parts glued together
fn part_text(part: &Value) -> String {
    if let Some(text) = part.get("text").and_then(Value::as_str) {
        return text.to_string();
    }
    part.get("parts")
        .and_then(Value::as_array)
        .map(|nested| {
            nested
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn from_generation(body: &Value) -> Option<(ResponseShape, String)> {
    let first = body.as_array().and_then(|items| items.first());
    if let Some(text) = first
        .and_then(|item| item.get("generated_text"))
        .and_then(Value::as_str)
        .and_then(non_empty)
    {
        return Some((ResponseShape::GenerationArray, text));
    }

    body.get("generated_text")
        .and_then(Value::as_str)
        .and_then(non_empty)
        .map(|text| (ResponseShape::GenerationDirect, text))
}

fn from_candidates(body: &Value) -> Option<(ResponseShape, String)> {
    let candidate = body.get("candidates")?.get(0)?;

    if let Some(parts) = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
    {
        let joined = parts
            .iter()
            .map(|p| p.get("text").and_then(Value::as_str).unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n");
        if let Some(text) = non_empty(&joined) {
            return Some((ResponseShape::CandidateParts, text));
        }
    }

    candidate
        .get("output")
        .and_then(Value::as_str)
        .and_then(non_empty)
        .map(|text| (ResponseShape::CandidateOutput, text))
}

/// Longest string value anywhere in the document, trimmed.
///
/// Lengths are raw character counts; on a tie the first string visited wins.
/// Object keys are not candidates. A winner that is only whitespace means no
/// match.
fn longest_string(body: &Value) -> Option<String> {
    let mut best: Option<&str> = None;
    visit(body, &mut best);
    best.and_then(non_empty)
}

fn visit<'a>(value: &'a Value, best: &mut Option<&'a str>) {
    match value {
        Value::String(s) => {
            if best.is_none_or(|b| s.chars().count() > b.chars().count()) {
                *best = Some(s.as_str());
            }
        }
        Value::Array(items) => items.iter().for_each(|item| visit(item, best)),
        Value::Object(map) => map.values().for_each(|item| visit(item, best)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
