//! Events produced by decoding an upstream SSE body.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum StreamingEvent {
    /// One fragment of assistant text, in arrival order.
    #[serde(rename = "ContentDelta")]
    ContentDelta { content: String, sequence_id: u64 },

    /// The response is complete, either by `[DONE]` or end of transport.
    #[serde(rename = "StreamEnd")]
    StreamEnd {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

impl StreamingEvent {
    /// Text carried by a content delta.
    pub fn as_content(&self) -> Option<&str> {
        match self {
            StreamingEvent::ContentDelta { content, .. } => Some(content),
            StreamingEvent::StreamEnd { .. } => None,
        }
    }
}
