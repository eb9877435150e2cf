//! HTTP surface of the proxy.
//!
//! | Route | Method | Behavior |
//! |-------|--------|----------|
//! | `/chat` | `OPTIONS` | 204 preflight |
//! | `/chat` | `POST` | coach: `text/event-stream` relay; analysis: JSON |
//! | `/health` | `GET` | `ok` |
//!
//! Every response carries the permissive CORS headers the browser client
//! expects, errors included.

mod response;

pub use response::{ApiError, ErrorBody};

use crate::proxy::{ChatProxy, ProxyResponse};
use crate::types::ChatRequest;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";

/// Shared by every route.
#[derive(Clone)]
pub struct AppState {
    proxy: ChatProxy,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(proxy: ChatProxy, shutdown: CancellationToken) -> Self {
        Self { proxy, shutdown }
    }

    pub fn proxy(&self) -> &ChatProxy {
        &self.proxy
    }

    /// Cancelling this token ends in-flight relays and stops the server.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat).options(preflight))
        .route("/health", get(health))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("access-control-allow-origin"),
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("access-control-allow-headers"),
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("access-control-allow-methods"),
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the shutdown token is cancelled.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "chat proxy listening");
    serve_on(listener, state).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn health() -> &'static str {
    "ok"
}

async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request = ChatRequest::from_slice(&body)?;

    // Cancelled when the response (or this future) is dropped, and when the
    // server shuts down.
    let cancel = state.shutdown.child_token();
    let guard = cancel.clone().drop_guard();

    match state.proxy.handle(request, cancel).await? {
        ProxyResponse::EventStream(stream) => {
            let stream = stream.map(move |chunk| {
                let _held = &guard;
                chunk
            });
            Ok((
                [
                    (CONTENT_TYPE, "text/event-stream"),
                    (CACHE_CONTROL, "no-cache"),
                ],
                Body::from_stream(stream),
            )
                .into_response())
        }
        ProxyResponse::Json(value) => Ok(Json(value).into_response()),
    }
}
