//! Consumer side of the chat proxy.
//!
//! [`ChatClient`] talks to a running proxy; [`CoachSession`] keeps a
//! [`Transcript`] and folds streamed deltas into it turn by turn.

pub mod builder;
pub mod core;
pub mod session;
pub mod transcript;

pub use builder::ChatClientBuilder;
pub use core::ChatClient;
pub use session::CoachSession;
pub use transcript::{Transcript, COACH_GREETING};
