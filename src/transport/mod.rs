//! Outbound HTTP to the upstream chat-completions gateway.

pub mod http;

pub use http::{GatewayRequest, GatewayTransport};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
