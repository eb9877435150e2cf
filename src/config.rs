//! Proxy configuration.
//!
//! Resolution order: built-in defaults, then an optional YAML file, then
//! environment variables. Nothing is read from the environment after
//! startup; the resolved [`ProxyConfig`] is handed to
//! [`ChatProxy::new`](crate::proxy::ChatProxy::new).

use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";

pub const ENV_GATEWAY_URL: &str = "AI_GATEWAY_URL";
pub const ENV_MODEL: &str = "AI_GATEWAY_MODEL";
pub const ENV_API_KEY: &str = "AI_GATEWAY_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "AI_HTTP_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "AI_HTTP_CONNECT_TIMEOUT_SECS";
pub const ENV_STREAM_IDLE_TIMEOUT_SECS: &str = "AI_STREAM_IDLE_TIMEOUT_SECS";
pub const ENV_POOL_MAX_IDLE_PER_HOST: &str = "AI_HTTP_POOL_MAX_IDLE_PER_HOST";
pub const ENV_OUTBOUND_PROXY: &str = "AI_PROXY_URL";

#[derive(Clone)]
pub struct ProxyConfig {
    /// Full URL of the upstream chat-completions endpoint.
    pub gateway_url: String,
    pub model: String,
    /// Bearer credential for the gateway. Absent means every request fails
    /// with a configuration error before any network call.
    pub api_key: Option<String>,
    /// Deadline for the upstream to answer with headers (and, in analysis
    /// mode, the whole body).
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Longest gap between two relayed stream chunks.
    pub stream_idle_timeout: Duration,
    /// Check that analysis answers carry a JSON object before relaying them.
    pub validate_structured_output: bool,
    pub pool_max_idle_per_host: usize,
    /// Outbound HTTP proxy for gateway traffic.
    pub outbound_proxy: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            stream_idle_timeout: Duration::from_secs(30),
            validate_structured_output: true,
            pool_max_idle_per_host: 32,
            outbound_proxy: None,
        }
    }
}

// Keeps the credential out of logs.
impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("gateway_url", &self.gateway_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("stream_idle_timeout", &self.stream_idle_timeout)
            .field("validate_structured_output", &self.validate_structured_output)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("outbound_proxy", &self.outbound_proxy)
            .finish()
    }
}

/// On-disk shape; every field optional so files only state what they change.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    gateway_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    stream_idle_timeout_secs: Option<u64>,
    validate_structured_output: Option<bool>,
    pool_max_idle_per_host: Option<usize>,
    outbound_proxy: Option<String>,
}

impl ProxyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults, then the YAML file at `path`, then the environment.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&text).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_source(path.display().to_string()),
            },
            other => other,
        })?;
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let file: FileConfig = serde_yaml::from_str(text).map_err(|e| {
            Error::configuration_with_context(
                "invalid config file",
                ErrorContext::new().with_details(e.to_string()),
            )
        })?;

        let mut config = Self::default();
        if let Some(v) = file.gateway_url {
            config.gateway_url = v;
        }
        if let Some(v) = file.model {
            config.model = v;
        }
        if file.api_key.is_some() {
            config.api_key = file.api_key;
        }
        if let Some(v) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.connect_timeout_secs {
            config.connect_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.stream_idle_timeout_secs {
            config.stream_idle_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.validate_structured_output {
            config.validate_structured_output = v;
        }
        if let Some(v) = file.pool_max_idle_per_host {
            config.pool_max_idle_per_host = v;
        }
        if file.outbound_proxy.is_some() {
            config.outbound_proxy = file.outbound_proxy;
        }
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_GATEWAY_URL) {
            self.gateway_url = v;
        }
        if let Some(v) = get(ENV_MODEL) {
            self.model = v;
        }
        if let Some(v) = get(ENV_API_KEY) {
            self.api_key = Some(v);
        }
        if let Some(v) = get(ENV_TIMEOUT_SECS) {
            self.request_timeout = Duration::from_secs(parse_number(ENV_TIMEOUT_SECS, &v)?);
        }
        if let Some(v) = get(ENV_CONNECT_TIMEOUT_SECS) {
            self.connect_timeout =
                Duration::from_secs(parse_number(ENV_CONNECT_TIMEOUT_SECS, &v)?);
        }
        if let Some(v) = get(ENV_STREAM_IDLE_TIMEOUT_SECS) {
            self.stream_idle_timeout =
                Duration::from_secs(parse_number(ENV_STREAM_IDLE_TIMEOUT_SECS, &v)?);
        }
        if let Some(v) = get(ENV_POOL_MAX_IDLE_PER_HOST) {
            self.pool_max_idle_per_host = parse_number(ENV_POOL_MAX_IDLE_PER_HOST, &v)?;
        }
        if let Some(v) = get(ENV_OUTBOUND_PROXY) {
            self.outbound_proxy = Some(v);
        }
        Ok(())
    }

    /// Credential for the upstream call, or the configuration error to answer with.
    pub fn credential(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::configuration_with_context(
                format!("{} is not configured", ENV_API_KEY),
                ErrorContext::new()
                    .with_field_path(ENV_API_KEY)
                    .with_source("proxy_config"),
            )),
        }
    }

    /// Fail-fast startup check.
    pub fn validate(&self) -> Result<()> {
        self.credential()?;

        let url = Url::parse(&self.gateway_url).map_err(|e| {
            Error::configuration_with_context(
                "gateway URL is not a valid URL",
                ErrorContext::new()
                    .with_field_path(ENV_GATEWAY_URL)
                    .with_details(e.to_string()),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                "gateway URL must use http or https",
                ErrorContext::new()
                    .with_field_path(ENV_GATEWAY_URL)
                    .with_details(url.scheme().to_string()),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model must not be empty",
                ErrorContext::new().with_field_path(ENV_MODEL),
            ));
        }

        for (name, value) in [
            (ENV_TIMEOUT_SECS, self.request_timeout),
            (ENV_CONNECT_TIMEOUT_SECS, self.connect_timeout),
            (ENV_STREAM_IDLE_TIMEOUT_SECS, self.stream_idle_timeout),
        ] {
            if value.is_zero() {
                return Err(Error::configuration_with_context(
                    "timeout must be greater than zero",
                    ErrorContext::new().with_field_path(name),
                ));
            }
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        Error::configuration_with_context(
            "expected a non-negative integer",
            ErrorContext::new()
                .with_field_path(key)
                .with_details(raw.to_string()),
        )
    })
}
