//! # livana-chat
//!
//! Chat-completion proxy and streaming client for the Livana nutrition coach.
//!
//! ## Overview
//!
//! A browser (or the bundled CLI) posts a conversation and a mode to the
//! proxy. The proxy puts a fixed system prompt in front of the conversation,
//! forwards it to an OpenAI-compatible gateway with the server-held key, and
//! relays the answer:
//!
//! - **coach**: the gateway's Server-Sent Events body, chunk by chunk
//! - **analysis**: the gateway's JSON completion, checked and returned as is
//!
//! On the consuming side, [`pipeline::SseDeltaDecoder`] turns the relayed
//! bytes into ordered text fragments regardless of how the network splits
//! them, and [`client::CoachSession`] folds those fragments into a
//! transcript.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use livana_chat::config::ProxyConfig;
//! use livana_chat::proxy::ChatProxy;
//! use livana_chat::server::{self, AppState};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> livana_chat::Result<()> {
//!     let config = ProxyConfig::from_env()?;
//!     config.validate()?;
//!
//!     let state = AppState::new(ChatProxy::new(config)?, CancellationToken::new());
//!     server::serve("127.0.0.1:8787".parse().unwrap(), state).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`proxy`] | Request forwarding, system prompts, stream relay |
//! | [`server`] | axum routes, CORS, error envelope, graceful shutdown |
//! | [`transport`] | Pooled HTTP client for the upstream gateway |
//! | [`pipeline`] | Incremental SSE decoding into [`StreamingEvent`]s |
//! | [`client`] | Proxy client, transcript and coach session |
//! | [`structured`] | JSON extraction and the typed meal analysis |
//! | [`config`] | Proxy configuration (defaults, YAML, environment) |
//! | [`types`] | Messages, modes, requests, events |
//! | [`error_code`] | Canonical error codes and their HTTP mapping |

pub mod client;
pub mod config;
pub mod error_code;
pub mod pipeline;
pub mod proxy;
pub mod server;
pub mod structured;
pub mod transport;
pub mod types;

pub use client::{ChatClient, CoachSession, Transcript};
pub use config::ProxyConfig;
pub use proxy::{ChatProxy, ProxyResponse};
pub use types::{ChatMessage, ChatMode, ChatRequest, MessageRole, StreamingEvent};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
