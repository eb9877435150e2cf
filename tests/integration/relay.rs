//! Coach relay timing: chunks are forwarded as they arrive, idle upstreams
//! are cut off, and shutdown ends open streams.

use crate::mock_server::*;
use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use futures::{stream, StreamExt};
use livana_chat::config::ProxyConfig;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const WAIT: Duration = Duration::from_secs(5);

/// Upstream that sends `first`, then holds the response open until `release`
/// is notified and finally sends `rest` (if any).
async fn spawn_slow_upstream(first: String, rest: Option<String>, release: Arc<Notify>) -> String {
    let app = Router::new().route(
        GATEWAY_PATH,
        post(move || {
            let first = first.clone();
            let rest = rest.clone();
            let release = release.clone();
            async move {
                let head = stream::once(async move { Ok::<_, Infallible>(Bytes::from(first)) });
                let tail = stream::once(async move {
                    release.notified().await;
                    rest
                })
                .filter_map(|rest| async move { rest.map(|r| Ok::<_, Infallible>(Bytes::from(r))) });
                (
                    [(CONTENT_TYPE, "text/event-stream")],
                    Body::from_stream(head.chain(tail)),
                )
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}{}", addr, GATEWAY_PATH)
}

/// Read from `body` until at least `len` bytes arrived.
async fn read_at_least<S>(body: &mut S, len: usize) -> Vec<u8>
where
    S: futures::Stream<Item = Result<Bytes, axum::Error>> + Unpin,
{
    let mut out = Vec::new();
    while out.len() < len {
        let chunk = tokio::time::timeout(WAIT, body.next())
            .await
            .expect("chunk was held back")
            .expect("body ended early")
            .expect("body failed");
        out.extend_from_slice(&chunk);
    }
    out
}

fn coach_request() -> axum::http::Request<Body> {
    chat_request(&json!({
        "messages": [{ "role": "user", "content": "hello" }],
        "mode": "coach"
    }))
}

#[tokio::test]
async fn test_first_chunk_arrives_before_upstream_finishes() {
    let release = Arc::new(Notify::new());
    let first = format!("data: {}\n\n", delta("Eat"));
    let rest = format!("data: {}\n\ndata: [DONE]\n\n", delta(" well."));
    let url = spawn_slow_upstream(first.clone(), Some(rest.clone()), release.clone()).await;

    let config = ProxyConfig::new(TEST_KEY).with_gateway_url(url);
    let response = app(config).oneshot(coach_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body().into_data_stream();
    let head = read_at_least(&mut body, first.len()).await;
    assert_eq!(head, first.into_bytes());

    release.notify_one();
    let mut tail = Vec::new();
    while let Some(chunk) = tokio::time::timeout(WAIT, body.next()).await.unwrap() {
        tail.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(tail, rest.into_bytes());
}

#[tokio::test]
async fn test_idle_upstream_is_cut_off() {
    let release = Arc::new(Notify::new());
    let first = format!("data: {}\n\n", delta("Eat"));
    let url = spawn_slow_upstream(first.clone(), None, release).await;

    let config = ProxyConfig::new(TEST_KEY)
        .with_gateway_url(url)
        .with_stream_idle_timeout(Duration::from_millis(200));
    let response = app(config).oneshot(coach_request()).await.unwrap();

    let mut body = response.into_body().into_data_stream();
    let head = read_at_least(&mut body, first.len()).await;
    assert_eq!(head, first.into_bytes());

    let next = tokio::time::timeout(WAIT, body.next())
        .await
        .expect("relay kept waiting on an idle upstream");
    assert!(matches!(next, Some(Err(_))));
}

#[tokio::test]
async fn test_shutdown_ends_open_relays() {
    let release = Arc::new(Notify::new());
    let first = format!("data: {}\n\n", delta("Eat"));
    let url = spawn_slow_upstream(first.clone(), None, release).await;

    let shutdown = CancellationToken::new();
    let config = ProxyConfig::new(TEST_KEY).with_gateway_url(url);
    let response = app_with_shutdown(config, shutdown.clone())
        .oneshot(coach_request())
        .await
        .unwrap();

    let mut body = response.into_body().into_data_stream();
    read_at_least(&mut body, first.len()).await;

    shutdown.cancel();
    let next = tokio::time::timeout(WAIT, body.next())
        .await
        .expect("relay outlived shutdown");
    assert!(next.is_none());
}

#[tokio::test]
async fn test_gateway_deadline_applies_to_headers() {
    let release = Arc::new(Notify::new());
    let app_upstream = Router::new().route(
        GATEWAY_PATH,
        post(move || {
            let release = release.clone();
            async move {
                release.notified().await;
                "never"
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app_upstream).await;
    });

    let config = ProxyConfig::new(TEST_KEY)
        .with_gateway_url(format!("http://{}{}", addr, GATEWAY_PATH))
        .with_request_timeout(Duration::from_millis(200));
    let resp = tokio::time::timeout(WAIT, send(app(config), coach_request()))
        .await
        .expect("proxy ignored its deadline");

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.json(), json!({ "error": "AI service timed out" }));
}
