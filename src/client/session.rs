use crate::client::core::ChatClient;
use crate::client::transcript::Transcript;
use crate::types::StreamingEvent;
use crate::{Error, ErrorContext, Result};
use futures::StreamExt;

/// A coach conversation bound to one client.
///
/// Each [`send`](CoachSession::send) posts the whole transcript, streams the
/// answer into it and returns the assistant text. Failed turns are not
/// retried; whatever text arrived before the failure stays in the transcript.
pub struct CoachSession {
    client: ChatClient,
    transcript: Transcript,
}

impl CoachSession {
    pub fn new(client: ChatClient) -> Self {
        Self::with_transcript(client, Transcript::with_greeting())
    }

    pub fn with_transcript(client: ChatClient, transcript: Transcript) -> Self {
        Self { client, transcript }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Send one user message. `on_delta` sees each fragment as it arrives.
    pub async fn send<F>(&mut self, text: &str, mut on_delta: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        if text.trim().is_empty() {
            return Err(Error::invalid_request_with_context(
                "message is empty",
                ErrorContext::new().with_field_path("text"),
            ));
        }

        self.transcript.push_user(text);
        let outcome = self.stream_turn(&mut on_delta).await;
        self.transcript.end_stream();

        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "coach turn failed");
        }
        outcome
    }

    async fn stream_turn<F>(&mut self, on_delta: &mut F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let mut events = self.client.stream_coach(self.transcript.messages()).await?;
        let mut reply = String::new();

        while let Some(event) = events.next().await {
            match event? {
                StreamingEvent::ContentDelta { content, .. } => {
                    self.transcript.append_delta(&content);
                    on_delta(&content);
                    reply.push_str(&content);
                }
                StreamingEvent::StreamEnd { finish_reason } => {
                    tracing::debug!(?finish_reason, chars = reply.len(), "coach turn finished");
                    break;
                }
            }
        }

        Ok(reply)
    }
}
