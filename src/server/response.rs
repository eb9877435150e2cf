use crate::error_code::StandardErrorCode;
use crate::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{ "error": "..." }`, the only error shape the proxy returns.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Adapter that renders a crate [`Error`] as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Classification used for the downstream answer.
    ///
    /// Gateway failures never surface as request errors or timeouts: a 400 or
    /// 504 from the gateway is reported as a generic service error. Only the
    /// proxy's own deadline answers "AI service timed out".
    pub fn code(&self) -> StandardErrorCode {
        match &self.0 {
            Error::Remote { status, .. } => StandardErrorCode::from_gateway_status(*status),
            other => other.code(),
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code().proxy_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Text shown to the caller. Upstream details stay in the log.
    pub fn public_message(&self) -> String {
        if let Some(fixed) = self.code().public_message() {
            return fixed.to_string();
        }
        match &self.0 {
            Error::Configuration { message, .. } | Error::InvalidRequest { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = %self.code(), "chat request failed");
        } else {
            tracing::warn!(error = %self.0, code = %self.code(), "chat request rejected");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
