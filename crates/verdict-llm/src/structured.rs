//! Structured-output extraction
//!
//! Models asked for JSON often wrap it in a markdown fence or add a line of
//! prose around it. These helpers recover the document.

use crate::{ModelError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A model answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ModelOutput {
    Structured(Value),
    Text(String),
}

impl ModelOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }
}

/// Remove a surrounding ``` or ```json fence
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Find and parse the JSON document in a model answer
pub fn extract_json(text: &str) -> Result<Value> {
    let body = strip_code_fence(text);
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(value);
    }

    let start = body.find(['{', '[']);
    let end = body.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if end > start => serde_json::from_str(&body[start..=end])
            .map_err(|e| ModelError::UnexpectedResponse(format!("malformed JSON: {e}"))),
        _ => Err(ModelError::UnexpectedResponse(
            "no JSON document in response".to_string(),
        )),
    }
}

/// Extract and deserialize a JSON answer
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_value(extract_json(text)?)?)
}
