//! The chat proxy: one inbound request, one upstream call, relayed back.
//!
//! ```text
//! ChatRequest ──► system prompt by mode ──► gateway (bearer, deadline, cancel)
//!                                             │
//!                      coach: raw SSE chunks ◄┤► analysis: JSON body, checked
//! ```
//!
//! Nothing is retried and nothing outlives the request: the relay stream ends
//! on upstream EOF, on cancellation, or after `stream_idle_timeout` without a
//! chunk.

pub mod prompts;

use crate::config::ProxyConfig;
use crate::structured::check_completion_object;
use crate::transport::{GatewayRequest, GatewayTransport, TransportError};
use crate::types::{ChatMessage, ChatMode, ChatRequest};
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// What the proxy hands back to the HTTP layer.
pub enum ProxyResponse {
    /// Upstream SSE bytes, forwarded chunk by chunk.
    EventStream(BoxStream<'static, Bytes>),
    /// Upstream completion body, unchanged.
    Json(Value),
}

impl std::fmt::Debug for ProxyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyResponse::EventStream(_) => f.write_str("EventStream(..)"),
            ProxyResponse::Json(v) => f.debug_tuple("Json").field(v).finish(),
        }
    }
}

#[derive(Clone)]
pub struct ChatProxy {
    inner: Arc<Inner>,
}

struct Inner {
    config: ProxyConfig,
    transport: GatewayTransport,
}

impl ChatProxy {
    /// Build a proxy around an explicit configuration.
    ///
    /// The configuration is not validated here; a missing credential is
    /// reported per request (see [`ProxyConfig::credential`]). Call
    /// [`ProxyConfig::validate`] first to fail fast at startup.
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let transport = GatewayTransport::new(&config)?;
        Ok(Self {
            inner: Arc::new(Inner { config, transport }),
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    /// Forward one request upstream.
    ///
    /// `cancel` aborts the call at any point: while waiting for the gateway,
    /// while reading an analysis body, or in the middle of a relayed stream.
    #[tracing::instrument(name = "chat_proxy", skip_all, fields(mode = %request.mode, request_id = tracing::field::Empty))]
    pub async fn handle(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ProxyResponse> {
        let config = &self.inner.config;
        let api_key = config.credential()?;

        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let system = ChatMessage::system(prompts::system_prompt(request.mode));
        let body = GatewayRequest::new(
            &config.model,
            &system,
            &request.messages,
            request.mode.is_streaming(),
        );

        let started = Instant::now();
        let deadline = started + config.request_timeout;
        tracing::debug!(
            messages = request.messages.len(),
            url = self.inner.transport.url(),
            "forwarding to gateway"
        );

        let response = guarded(
            "gateway response",
            started,
            deadline,
            &cancel,
            self.inner.transport.send(&body, api_key, &request_id),
        )
        .await?;

        match request.mode {
            ChatMode::Coach => {
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "relaying gateway stream"
                );
                let upstream = response
                    .bytes_stream()
                    .map(|r| r.map_err(|e| Error::Transport(TransportError::Http(e))));
                Ok(ProxyResponse::EventStream(relay(
                    upstream,
                    config.stream_idle_timeout,
                    cancel,
                )))
            }
            ChatMode::Analysis => {
                let body: Value = guarded("gateway body", started, deadline, &cancel, async {
                    response
                        .json::<Value>()
                        .await
                        .map_err(|e| Error::Transport(TransportError::Http(e)))
                })
                .await?;

                if config.validate_structured_output {
                    check_completion_object(&body).map_err(|errors| {
                        tracing::error!(?errors, "gateway returned malformed structured output");
                        Error::validation("gateway returned malformed structured output", errors)
                    })?;
                }

                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "returning gateway analysis"
                );
                Ok(ProxyResponse::Json(body))
            }
        }
    }
}

/// Run `fut` until it finishes, the deadline passes, or `cancel` fires.
async fn guarded<T, F>(
    stage: &'static str,
    started: Instant,
    deadline: Instant,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(stage, "request cancelled");
            Err(Error::Cancelled)
        }
        outcome = tokio::time::timeout_at(deadline, fut) => match outcome {
            Ok(result) => result,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::warn!(stage, elapsed_ms, "gateway deadline exceeded");
                Err(Error::Timeout { stage, elapsed_ms })
            }
        },
    }
}

struct RelayState<S> {
    upstream: Pin<Box<S>>,
    cancel: CancellationToken,
    relayed: usize,
    finished: bool,
}

/// Forward upstream chunks as they arrive.
///
/// Ends on upstream EOF or cancellation. An upstream error, or `idle`
/// passing without a chunk, is yielded once and then ends the stream.
pub fn relay<S>(upstream: S, idle: Duration, cancel: CancellationToken) -> BoxStream<'static, Bytes>
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    let state = RelayState {
        upstream: Box::pin(upstream),
        cancel,
        relayed: 0,
        finished: false,
    };

    let stream = stream::unfold(state, move |mut st| async move {
        if st.finished {
            return None;
        }

        let next = tokio::select! {
            biased;
            _ = st.cancel.cancelled() => {
                tracing::debug!(bytes = st.relayed, "relay cancelled");
                return None;
            }
            next = tokio::time::timeout(idle, st.upstream.next()) => next,
        };

        match next {
            Ok(Some(Ok(bytes))) => {
                st.relayed += bytes.len();
                Some((Ok(bytes), st))
            }
            Ok(Some(Err(e))) => {
                tracing::warn!(error = %e, bytes = st.relayed, "gateway stream failed");
                st.finished = true;
                Some((Err(e), st))
            }
            Ok(None) => {
                tracing::debug!(bytes = st.relayed, "gateway stream finished");
                None
            }
            Err(_) => {
                tracing::warn!(bytes = st.relayed, "gateway stream went idle");
                st.finished = true;
                Some((
                    Err(Error::Timeout {
                        stage: "next stream chunk",
                        elapsed_ms: idle.as_millis() as u64,
                    }),
                    st,
                ))
            }
        }
    });

    Box::pin(stream)
}
