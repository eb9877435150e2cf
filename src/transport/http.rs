use crate::config::ProxyConfig;
use crate::transport::TransportError;
use crate::types::ChatMessage;
use crate::{Error, Result};
use reqwest::Proxy;
use serde::Serialize;
use std::time::Duration;

/// Body sent to the gateway: the caller's conversation behind one system prompt.
#[derive(Debug, Serialize)]
pub struct GatewayRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<&'a ChatMessage>,
    pub stream: bool,
}

impl<'a> GatewayRequest<'a> {
    pub fn new(
        model: &'a str,
        system: &'a ChatMessage,
        conversation: &'a [ChatMessage],
        stream: bool,
    ) -> Self {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(system);
        messages.extend(conversation.iter());
        Self {
            model,
            messages,
            stream,
        }
    }
}

/// Pooled HTTP client bound to one gateway endpoint.
pub struct GatewayTransport {
    client: reqwest::Client,
    url: String,
}

impl GatewayTransport {
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        // No total timeout on the client: streamed answers may legitimately run
        // for minutes. Deadlines are enforced per phase by the proxy.
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.outbound_proxy {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!(error = %e, "ignoring invalid outbound proxy URL"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            url: config.gateway_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the request and return the response once its headers arrive.
    ///
    /// Non-2xx answers are logged with their body and turned into
    /// [`Error::Remote`]; the body never travels further than the log.
    pub async fn send(
        &self,
        request: &GatewayRequest<'_>,
        api_key: &str,
        request_id: &str,
    ) -> Result<reqwest::Response> {
        let mut req = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .header("x-request-id", request_id)
            .json(request);

        if request.stream {
            req = req.header("accept", "text/event-stream");
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %text, "AI gateway error");
            return Err(Error::remote(status.as_u16(), text));
        }

        Ok(resp)
    }
}
