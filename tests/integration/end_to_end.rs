//! Client, proxy and mock gateway wired together over real sockets.

use crate::mock_server::*;
use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::routing::post;
use axum::Router;
use futures::stream;
use livana_chat::client::{ChatClient, CoachSession};
use livana_chat::error_code::StandardErrorCode;
use livana_chat::types::MessageRole;
use livana_chat::Error;
use std::convert::Infallible;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_coach_turn_streams_into_the_transcript() {
    let fixture = MockServerFixture::new().await;
    let (eat, a, banana) = (delta("Eat"), delta(" a"), delta(" banana."));
    let mock = fixture
        .mock_sse_stream(&[&eat, &a, &banana, "[DONE]"])
        .await;

    let endpoint = spawn_proxy(fixture.config(), CancellationToken::new()).await;
    let client = ChatClient::builder(endpoint).token("publishable").build().unwrap();
    let mut session = CoachSession::new(client);

    let mut seen = Vec::new();
    let reply = session
        .send("What should I snack on?", |d| seen.push(d.to_string()))
        .await
        .unwrap();

    assert_eq!(reply, "Eat a banana.");
    assert_eq!(seen, vec!["Eat", " a", " banana."]);

    let transcript = session.transcript();
    assert!(!transcript.is_streaming());
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript.messages()[1].role, MessageRole::User);
    assert_eq!(transcript.messages()[2].role, MessageRole::Assistant);
    assert_eq!(transcript.messages()[2].content, "Eat a banana.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_workout_question_yields_eat_a_banana() {
    let fixture = MockServerFixture::new().await;
    let body = format!(
        "data: {}\ndata: {}\ndata: [DONE]\n",
        delta("Eat a "),
        delta("banana.")
    );
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", GATEWAY_PATH)
            .match_body(mockito::Matcher::Regex(
                r#"\{"role":"user","content":"What should I eat before a workout\?"\}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    };

    let endpoint = spawn_proxy(fixture.config(), CancellationToken::new()).await;
    let mut session = CoachSession::new(ChatClient::new(endpoint).unwrap());

    let mut seen = Vec::new();
    let reply = session
        .send("What should I eat before a workout?", |d| seen.push(d.to_string()))
        .await
        .unwrap();

    assert_eq!(reply, "Eat a banana.");
    assert_eq!(seen, vec!["Eat a ", "banana."]);
    assert_eq!(session.transcript().last().unwrap().content, "Eat a banana.");
    assert!(!session.transcript().is_streaming());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_analyze_meal_returns_a_validated_result() {
    let fixture = MockServerFixture::new().await;
    let content = "```json\n{\"name\":\"Oatmeal with berries\",\"calories\":320,\"macros\":{\"protein\":9,\"carbs\":58,\"fat\":6,\"fiber\":8},\"insights\":[\"High in fiber\"],\"suggestions\":[\"Add nuts for protein\"],\"score\":84}\n```";
    let mock = fixture
        .mock_json_response(200, &completion(content).to_string())
        .await;

    let endpoint = spawn_proxy(fixture.config(), CancellationToken::new()).await;
    let client = ChatClient::new(endpoint).unwrap();
    let analysis = client.analyze_meal("oatmeal with berries").await.unwrap();

    assert_eq!(analysis.name, "Oatmeal with berries");
    assert_eq!(analysis.calories, 320.0);
    assert_eq!(analysis.macros.fiber, 8.0);
    assert_eq!(analysis.score, 84.0);
    assert_eq!(analysis.suggestions, vec!["Add nuts for protein"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_proxy_error_message_reaches_the_client() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_json_response(429, r#"{"error":"slow down"}"#).await;

    let endpoint = spawn_proxy(fixture.config(), CancellationToken::new()).await;
    let mut session = CoachSession::new(ChatClient::new(endpoint).unwrap());
    let err = session.send("hi", |_| {}).await.unwrap_err();

    match err {
        Error::Remote {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 429);
            assert_eq!(code, StandardErrorCode::RateLimited);
            assert_eq!(message, "Rate limit exceeded. Please try again later.");
        }
        other => panic!("unexpected error: {other}"),
    }
    // greeting + the user message; no assistant message was opened
    assert_eq!(session.transcript().len(), 2);
    assert!(!session.transcript().is_streaming());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_partial_reply_survives_a_mid_stream_failure() {
    // Upstream sends one delta and then stalls; the proxy's idle timeout
    // aborts the relayed body.
    let first = format!("data: {}\n\n", delta("Half an"));
    let upstream = Router::new().route(
        GATEWAY_PATH,
        post(move || {
            let first = first.clone();
            async move {
                let body = futures::StreamExt::chain(
                    stream::once(async move { Ok::<_, Infallible>(Bytes::from(first)) }),
                    stream::pending(),
                );
                ([(CONTENT_TYPE, "text/event-stream")], Body::from_stream(body))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, upstream).await;
    });

    let config = livana_chat::ProxyConfig::new(TEST_KEY)
        .with_gateway_url(format!("http://{}{}", addr, GATEWAY_PATH))
        .with_stream_idle_timeout(Duration::from_millis(200));
    let endpoint = spawn_proxy(config, CancellationToken::new()).await;
    let mut session = CoachSession::new(ChatClient::new(endpoint).unwrap());

    let result = tokio::time::timeout(Duration::from_secs(5), session.send("hi", |_| {}))
        .await
        .expect("client hung on an aborted stream");
    assert!(result.is_err());

    let transcript = session.transcript();
    assert!(!transcript.is_streaming());
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript.messages()[2].content, "Half an");
}
