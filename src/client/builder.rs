use crate::client::core::ChatClient;
use crate::transport::TransportError;
use crate::{Error, ErrorContext, Result};
use std::time::Duration;
use url::Url;

/// Builder for [`ChatClient`].
///
/// Keep this surface area small: an endpoint, an optional token, timeouts.
pub struct ChatClientBuilder {
    endpoint: String,
    token: Option<String>,
    connect_timeout: Duration,
    timeout: Option<Duration>,
}

impl ChatClientBuilder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            timeout: None,
        }
    }

    /// Bearer token sent with every request (the hosted function's publishable key).
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into()).filter(|t: &String| !t.is_empty());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Total time allowed per request, body included.
    ///
    /// Unset by default, since a coach answer is streamed for as long as the
    /// model keeps writing.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ChatClient> {
        let endpoint = Url::parse(&self.endpoint).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid chat endpoint '{}'", self.endpoint),
                ErrorContext::new()
                    .with_field_path("endpoint")
                    .with_details(e.to_string()),
            )
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("chat endpoint must be http(s), got '{}'", endpoint.scheme()),
                ErrorContext::new().with_field_path("endpoint"),
            ));
        }

        let mut builder = reqwest::Client::builder().connect_timeout(self.connect_timeout);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(ChatClient {
            http,
            endpoint,
            token: self.token,
        })
    }
}
