//! Core data types shared by the proxy and its streaming client.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatMessage`] | One conversation turn (role + text) |
//! | [`MessageRole`] | user, assistant, or system |
//! | [`ChatRequest`] | Inbound proxy request: conversation plus [`ChatMode`] |
//! | [`ChatMode`] | Coach (streamed) or Analysis (buffered JSON) |
//! | [`StreamingEvent`] | Decoded SSE output: content deltas and stream end |
//!
//! ## Example
//!
//! ```rust
//! use livana_chat::types::{ChatMessage, ChatMode, ChatRequest};
//!
//! let request = ChatRequest::new(
//!     vec![ChatMessage::user("What should I eat before a workout?")],
//!     ChatMode::Coach,
//! );
//! let wire = serde_json::to_value(&request).unwrap();
//! assert_eq!(wire["mode"], "coach");
//! assert_eq!(wire["messages"][0]["role"], "user");
//! ```

pub mod events;
pub mod message;
pub mod request;

pub use events::StreamingEvent;
pub use message::{ChatMessage, MessageRole};
pub use request::{ChatMode, ChatRequest};
