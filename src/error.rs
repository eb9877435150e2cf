use crate::error_code::StandardErrorCode;
use crate::structured::ValidationError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "AI_GATEWAY_API_KEY", "request.mode")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "proxy_config", "chat_request")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the chat proxy and its client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// The inbound request was malformed (unknown mode, empty conversation, bad JSON).
    #[error("Invalid request: {message}{}", format_context(.context))]
    InvalidRequest {
        message: String,
        context: ErrorContext,
    },

    /// The upstream answered 2xx but its payload did not match the expected shape.
    #[error("Validation error: {message}{}", format_validation(.errors))]
    Validation {
        message: String,
        errors: Vec<ValidationError>,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Remote error: HTTP {status} ({code}): {message}")]
    Remote {
        status: u16,
        code: StandardErrorCode,
        message: String,
    },

    #[error("Timed out after {elapsed_ms} ms waiting for {stage}")]
    Timeout { stage: &'static str, elapsed_ms: u64 },

    #[error("Request cancelled")]
    Cancelled,
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_validation(errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    format!(" [{}]", joined.join("; "))
}

impl Error {
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn invalid_request_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidRequest {
            message: msg.into(),
            context,
        }
    }

    pub fn validation(msg: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Error::Validation {
            message: msg.into(),
            errors,
        }
    }

    /// Build a remote error from an HTTP status, classifying it on the way.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Error::Remote {
            status,
            code: StandardErrorCode::from_http_status(status),
            message: message.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::InvalidRequest { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Canonical classification of this error.
    pub fn code(&self) -> StandardErrorCode {
        match self {
            Error::Configuration { .. } => StandardErrorCode::Configuration,
            Error::InvalidRequest { .. } => StandardErrorCode::InvalidRequest,
            Error::Remote { code, .. } => *code,
            Error::Timeout { .. } => StandardErrorCode::Timeout,
            Error::Cancelled => StandardErrorCode::Cancelled,
            Error::Validation { .. }
            | Error::Serialization(_)
            | Error::Transport(_)
            | Error::Io(_) => StandardErrorCode::ServerError,
        }
    }
}
