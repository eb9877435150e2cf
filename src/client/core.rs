use crate::client::builder::ChatClientBuilder;
use crate::pipeline::decode_events;
use crate::structured::AnalysisResult;
use crate::transport::TransportError;
use crate::types::{ChatMessage, ChatMode, ChatRequest, StreamingEvent};
use crate::{BoxStream, Error, ErrorContext, Result};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// HTTP client for the proxy's `/chat` endpoint.
#[derive(Clone)]
pub struct ChatClient {
    pub(crate) http: reqwest::Client,
    pub(crate) endpoint: Url,
    pub(crate) token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        ChatClientBuilder::new(endpoint).build()
    }

    pub fn builder(endpoint: impl Into<String>) -> ChatClientBuilder {
        ChatClientBuilder::new(endpoint)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Send a coach conversation and decode the relayed SSE body.
    ///
    /// The returned stream yields content deltas in order and ends with a
    /// single [`StreamingEvent::StreamEnd`].
    pub async fn stream_coach(
        &self,
        messages: &[ChatMessage],
    ) -> Result<BoxStream<'static, StreamingEvent>> {
        let request = ChatRequest::new(messages.to_vec(), ChatMode::Coach);
        let resp = self.post(&request).await?;

        let bytes = resp
            .bytes_stream()
            .map(|r| r.map_err(|e| Error::Transport(TransportError::Http(e))));
        Ok(decode_events(Box::pin(bytes)))
    }

    /// Ask for a structured analysis of a meal description.
    pub async fn analyze_meal(&self, description: &str) -> Result<AnalysisResult> {
        if description.trim().is_empty() {
            return Err(Error::invalid_request_with_context(
                "meal description is empty",
                ErrorContext::new().with_field_path("description"),
            ));
        }

        let request = ChatRequest::new(vec![ChatMessage::user(description)], ChatMode::Analysis);
        let resp = self.post(&request).await?;
        let body: Value = resp.json().await.map_err(TransportError::from)?;
        AnalysisResult::from_completion(&body)
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let mut req = self.http.post(self.endpoint.clone()).json(request);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        tracing::debug!(
            mode = %request.mode,
            messages = request.messages.len(),
            "posting chat request"
        );
        let resp = req.send().await.map_err(TransportError::from)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error)
            .unwrap_or_else(|_| format!("chat service returned HTTP {}", status.as_u16()));
        tracing::warn!(status = status.as_u16(), %message, "chat request failed");
        Err(Error::remote(status.as_u16(), message))
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
