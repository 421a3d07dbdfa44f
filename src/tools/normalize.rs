use crate::catalog::value_kind;
use serde_json::{Value, json};
use tracing::warn;

const ENVELOPE_KEY: &str = "response";
const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// The `{"response": [...]}` shape every tool call ends in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    response: Value,
}

impl ResponseEnvelope {
    /// One-element envelope carrying a message or raw model text.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            response: json!([text.into()]),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({ ENVELOPE_KEY: self.response })
    }

    pub fn to_text(&self) -> String {
        self.to_value().to_string()
    }
}

/// Fence-stripped model output, tagged by whether it parsed as JSON.
#[derive(Debug)]
pub enum ModelOutput {
    Parsed(Value),
    Unparsed { text: String, reason: String },
}

impl ModelOutput {
    /// `text` must already be fence-stripped.
    pub fn read(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => ModelOutput::Parsed(value),
            Err(err) => ModelOutput::Unparsed {
                text: text.to_string(),
                reason: err.to_string(),
            },
        }
    }
}

/// Never fails: anything that is not an object with a `response` key is
/// wrapped verbatim. The inner value is passed through without coercion.
pub fn normalize(raw: &str) -> ResponseEnvelope {
    let text = strip_fence(raw);
    match ModelOutput::read(text) {
        ModelOutput::Parsed(Value::Object(mut map)) if map.contains_key(ENVELOPE_KEY) => {
            ResponseEnvelope {
                response: map.remove(ENVELOPE_KEY).unwrap_or(Value::Null),
            }
        }
        ModelOutput::Parsed(other) => {
            warn!(
                found = value_kind(&other),
                "model output is JSON without a response key; wrapping raw text"
            );
            ResponseEnvelope::message(text)
        }
        ModelOutput::Unparsed { text, reason } => {
            warn!(error = %reason, "failed to parse model output; wrapping raw text");
            ResponseEnvelope::message(text)
        }
    }
}

pub fn strip_fence(raw: &str) -> &str {
    let text = raw.trim();
    let text = text
        .strip_prefix(JSON_FENCE)
        .or_else(|| text.strip_prefix(FENCE))
        .unwrap_or(text);
    let text = text.strip_suffix(FENCE).unwrap_or(text);
    text.trim()
}
