//! Mock gateway and in-process proxy setup for integration tests.

use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use livana_chat::config::ProxyConfig;
use livana_chat::proxy::ChatProxy;
use livana_chat::server::{self, AppState};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const GATEWAY_PATH: &str = "/v1/chat/completions";
pub const TEST_KEY: &str = "test-gateway-key";

/// Test fixture that manages a mock gateway
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    pub fn gateway_url(&self) -> String {
        format!("{}{}", self.base_url, GATEWAY_PATH)
    }

    /// Proxy configuration pointing at the mock gateway, holding `TEST_KEY`.
    pub fn config(&self) -> ProxyConfig {
        ProxyConfig::new(TEST_KEY).with_gateway_url(self.gateway_url())
    }

    /// Same as [`config`](Self::config) but without a credential.
    pub fn config_without_key(&self) -> ProxyConfig {
        ProxyConfig::default().with_gateway_url(self.gateway_url())
    }

    /// Mock a gateway SSE answer built from `data:` payloads.
    pub async fn mock_sse_stream(&self, payloads: &[&str]) -> Mock {
        let body: String = payloads
            .iter()
            .map(|payload| format!("data: {}\n\n", payload))
            .collect();

        let mut server = self.server.lock().await;
        server
            .mock("POST", GATEWAY_PATH)
            .match_header("authorization", format!("Bearer {}", TEST_KEY).as_str())
            .match_body(Matcher::PartialJson(json!({ "stream": true })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }

    /// Mock a JSON answer with an arbitrary status.
    pub async fn mock_json_response(&self, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", GATEWAY_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Mock that must never be hit.
    pub async fn mock_unreachable(&self) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .expect(0)
            .create_async()
            .await
    }
}

/// A completion body whose message content is `content`.
pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "google/gemini-3-flash-preview",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// A streamed delta payload carrying `text`.
pub fn delta(text: &str) -> String {
    json!({ "choices": [{ "index": 0, "delta": { "content": text } }] }).to_string()
}

pub fn app(config: ProxyConfig) -> Router {
    app_with_shutdown(config, CancellationToken::new())
}

pub fn app_with_shutdown(config: ProxyConfig, shutdown: CancellationToken) -> Router {
    let proxy = ChatProxy::new(config).expect("proxy");
    server::router(AppState::new(proxy, shutdown))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub fn chat_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/chat")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Drive one request through the router and collect the whole response.
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    TestResponse {
        status,
        headers,
        body,
    }
}

/// Run the proxy on an ephemeral port. Returns its `/chat` URL.
pub async fn spawn_proxy(config: ProxyConfig, shutdown: CancellationToken) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("addr");
    let state = AppState::new(ChatProxy::new(config).expect("proxy"), shutdown);
    tokio::spawn(async move {
        let _ = server::serve_on(listener, state).await;
    });
    format!("http://{}/chat", addr)
}
