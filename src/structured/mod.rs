//! Structured (JSON) output returned by the gateway in `analysis` mode.
//!
//! The model is told to answer with a bare JSON object, but it is still free
//! text: it may arrive wrapped in a markdown fence or not at all. This module
//! turns that text into a checked value:
//!
//! - [`extract_json`]: find the JSON in a model answer
//! - [`check_completion_object`]: the proxy-side gate (content is a JSON object)
//! - [`AnalysisResult`]: the typed meal analysis with range validation
//!
//! # Examples
//!
//! ```
//! use livana_chat::structured::extract_json;
//!
//! let value = extract_json("```json\n{\"score\": 72}\n```").unwrap();
//! assert_eq!(value["score"], 72);
//! ```

pub mod analysis;
pub mod error;

pub use analysis::{AnalysisResult, MacroBreakdown};
pub use error::{ValidationError, ValidationReport};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"```json\s*([\s\S]*?)\s*```",
        r"```\s*([\s\S]*?)\s*```",
        r"\{[\s\S]*\}",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Parse JSON from model text, with support for markdown code blocks.
pub fn extract_json(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(parsed) = serde_json::from_str::<Value>(text) {
        return Some(parsed);
    }

    for re in FENCE_PATTERNS.iter() {
        if let Some(captures) = re.captures(text) {
            let candidate = match captures.get(1) {
                Some(inner) => inner.as_str(),
                None => captures.get(0).map(|c| c.as_str()).unwrap_or(text),
            };
            if let Ok(parsed) = serde_json::from_str::<Value>(candidate.trim()) {
                return Some(parsed);
            }
        }
    }

    None
}

/// `choices[0].message.content` of a chat-completion body.
pub fn completion_content(body: &Value) -> Option<&str> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
}

/// Check that a completion body carries a JSON object as its message content.
///
/// The schema of that object depends on the caller's prompt (meal analysis,
/// meal plans, goal recommendations), so only the common shape is enforced
/// here. Returns the extracted object.
pub fn check_completion_object(body: &Value) -> Result<Value, Vec<ValidationError>> {
    let Some(content) = completion_content(body) else {
        return Err(vec![ValidationError::with_path(
            "missing or not a string",
            "choices[0].message.content".to_string(),
        )]);
    };

    match extract_json(content) {
        Some(value @ Value::Object(_)) => Ok(value),
        Some(other) => Err(vec![ValidationError::new(
            "expected a JSON object",
            Some("choices[0].message.content".to_string()),
            Some(other),
        )]),
        None => Err(vec![ValidationError::with_path(
            "content is not JSON",
            "choices[0].message.content".to_string(),
        )]),
    }
}
