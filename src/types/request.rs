//! Inbound proxy request and the mode that drives prompt and response handling.

use crate::types::message::ChatMessage;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which system prompt is injected and how the upstream answer is relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Conversational coaching, relayed as a live SSE stream.
    Coach,
    /// Structured meal analysis, returned as one JSON body.
    Analysis,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Coach => "coach",
            ChatMode::Analysis => "analysis",
        }
    }

    /// Whether the upstream is asked to stream.
    pub fn is_streaming(&self) -> bool {
        matches!(self, ChatMode::Coach)
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "coach" => Ok(ChatMode::Coach),
            "analysis" => Ok(ChatMode::Analysis),
            other => Err(Error::invalid_request_with_context(
                format!("unsupported mode '{}'", other),
                ErrorContext::new()
                    .with_field_path("mode")
                    .with_details("expected one of: coach, analysis"),
            )),
        }
    }
}

/// A validated chat request: a non-empty conversation plus an explicit mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub mode: ChatMode,
}

/// Wire shape before validation. Browser clients post the mode as `type`;
/// when both are present `mode` wins.
#[derive(Deserialize)]
struct RawChatRequest {
    #[serde(default)]
    messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default, rename = "type")]
    legacy_mode: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>, mode: ChatMode) -> Self {
        Self { messages, mode }
    }

    /// Parse and validate a request body.
    ///
    /// Fails with [`Error::InvalidRequest`] when the body is not JSON, the
    /// mode is missing or unknown, or the conversation is empty.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let raw: RawChatRequest = serde_json::from_slice(body).map_err(|e| {
            Error::invalid_request_with_context(
                "request body is not a valid chat request",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("chat_request"),
            )
        })?;

        let mode = match raw.mode.as_deref().or(raw.legacy_mode.as_deref()) {
            Some(mode) => mode.parse::<ChatMode>()?,
            None => {
                return Err(Error::invalid_request_with_context(
                    "missing mode",
                    ErrorContext::new()
                        .with_field_path("mode")
                        .with_details("expected one of: coach, analysis"),
                ))
            }
        };

        let messages = raw.messages.unwrap_or_default();
        if messages.is_empty() {
            return Err(Error::invalid_request_with_context(
                "messages must contain at least one entry",
                ErrorContext::new().with_field_path("messages"),
            ));
        }

        Ok(Self { messages, mode })
    }
}
