//! Client-side streaming pipeline.
//!
//! ```text
//! HTTP body bytes → SseDeltaDecoder → StreamingEvent::ContentDelta … StreamEnd
//!        │                 │
//!   arbitrary chunk    line splitting, `data: ` prefix,
//!   boundaries         `[DONE]`, partial-line hold back
//! ```
//!
//! The proxy never parses the stream it relays; decoding happens only where
//! the text is consumed (the coach client and its CLI).

pub mod decode;

pub use decode::{decode_events, SseDeltaDecoder, DATA_PREFIX, DONE_SIGNAL};
