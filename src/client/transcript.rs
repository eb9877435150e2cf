//! The running coach conversation.

use crate::types::ChatMessage;

/// First assistant message of every coach conversation.
pub const COACH_GREETING: &str = "Hello! I'm **Mr. Livana**, your personal AI nutrition coach. 🌿\n\n\
I'm here to help you make healthier food choices, understand your nutrition needs, and reach your \
wellness goals. Whether you're looking to lose weight, build muscle, or simply eat better, I've got \
you covered!\n\nWhat would you like to know about nutrition today?";

/// Ordered messages plus whether the last one is still being streamed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    streaming: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript opened by [`COACH_GREETING`].
    pub fn with_greeting() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(COACH_GREETING)],
            streaming: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Append a user message. Closes any open assistant stream first.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.streaming = false;
        self.messages.push(ChatMessage::user(text));
    }

    /// Add one streamed fragment.
    ///
    /// The first fragment of a turn opens a new assistant message; later ones
    /// extend it.
    pub fn append_delta(&mut self, delta: &str) {
        if !self.streaming {
            self.messages.push(ChatMessage::assistant(String::new()));
            self.streaming = true;
        }
        if let Some(last) = self.messages.last_mut() {
            last.content.push_str(delta);
        }
    }

    /// Close the current stream. Returns the streamed text, if a stream was open.
    pub fn end_stream(&mut self) -> Option<&str> {
        if !std::mem::take(&mut self.streaming) {
            return None;
        }
        self.messages.last().map(|m| m.content.as_str())
    }
}
