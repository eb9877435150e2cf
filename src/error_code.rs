//! Canonical error codes and their mapping onto the proxy's HTTP surface.
//!
//! Upstream gateway failures are classified once, at the transport boundary,
//! into a [`StandardErrorCode`]. The code then decides which status the proxy
//! answers with and which message the browser sees. Callers never inspect
//! provider-specific error shapes.
//!
//! | Prefix | Category    | Description                    |
//! |--------|-------------|--------------------------------|
//! | E1xxx  | client      | Request-side errors            |
//! | E2xxx  | rate        | Rate limit and quota errors    |
//! | E3xxx  | server      | Gateway-side errors            |
//! | E4xxx  | operational | Lifecycle and configuration    |
//! | E9xxx  | unknown     | Catch-all / unclassified       |
//!
//! ## Example
//!
//! ```rust
//! use livana_chat::error_code::StandardErrorCode;
//!
//! let code = StandardErrorCode::from_http_status(402);
//! assert_eq!(code.code(), "E2002");
//! assert_eq!(code.proxy_status(), 402);
//! assert_eq!(code.category(), "rate");
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardErrorCode {
    /// E1001: Malformed request, unknown mode, or missing required fields
    InvalidRequest,
    /// E1002: Gateway rejected the credential
    Authentication,
    /// E1003: Valid credential but insufficient permissions
    PermissionDenied,
    /// E1004: Model or endpoint does not exist
    NotFound,
    /// E1005: Conversation exceeds the gateway's payload or context limit
    RequestTooLarge,
    /// E2001: Request rate limit exceeded
    RateLimited,
    /// E2002: Account usage quota or credits exhausted
    QuotaExhausted,
    /// E3001: Gateway failed or returned something unusable
    ServerError,
    /// E3002: Gateway temporarily overloaded
    Overloaded,
    /// E3003: No response (or no next chunk) before the deadline
    Timeout,
    /// E4001: The inbound request went away or the server is shutting down
    Cancelled,
    /// E4002: The proxy itself is misconfigured
    Configuration,
    /// E9999: Error could not be classified
    Unknown,
}

impl StandardErrorCode {
    /// Returns the canonical code string (e.g., `"E1001"`).
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "E1001",
            Self::Authentication => "E1002",
            Self::PermissionDenied => "E1003",
            Self::NotFound => "E1004",
            Self::RequestTooLarge => "E1005",
            Self::RateLimited => "E2001",
            Self::QuotaExhausted => "E2002",
            Self::ServerError => "E3001",
            Self::Overloaded => "E3002",
            Self::Timeout => "E3003",
            Self::Cancelled => "E4001",
            Self::Configuration => "E4002",
            Self::Unknown => "E9999",
        }
    }

    /// Returns the standard name (e.g., `"rate_limited"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Authentication => "authentication",
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::RequestTooLarge => "request_too_large",
            Self::RateLimited => "rate_limited",
            Self::QuotaExhausted => "quota_exhausted",
            Self::ServerError => "server_error",
            Self::Overloaded => "overloaded",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Configuration => "configuration",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the category: `"client"`, `"rate"`, `"server"`, `"operational"`, or `"unknown"`.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest
            | Self::Authentication
            | Self::PermissionDenied
            | Self::NotFound
            | Self::RequestTooLarge => "client",
            Self::RateLimited | Self::QuotaExhausted => "rate",
            Self::ServerError | Self::Overloaded | Self::Timeout => "server",
            Self::Cancelled | Self::Configuration => "operational",
            Self::Unknown => "unknown",
        }
    }

    /// Maps an HTTP status code (as returned by the gateway) to a code.
    ///
    /// 402 is how the gateway reports exhausted credits, so it gets its own
    /// class rather than falling into the generic bucket.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::InvalidRequest,
            401 => Self::Authentication,
            402 => Self::QuotaExhausted,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            413 => Self::RequestTooLarge,
            429 => Self::RateLimited,
            503 | 529 => Self::Overloaded,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Class the proxy answers with when the gateway itself failed.
    ///
    /// Only rate limiting and quota exhaustion are passed on; every other
    /// non-2xx (gateway timeouts and rejected requests included) is a
    /// generic service error.
    pub fn from_gateway_status(status: u16) -> Self {
        match Self::from_http_status(status) {
            code @ (Self::RateLimited | Self::QuotaExhausted) => code,
            _ => Self::ServerError,
        }
    }

    /// Status the proxy answers with when an error of this class ends a request.
    ///
    /// Only rate limiting and quota exhaustion keep their upstream status;
    /// request-side problems are the caller's fault (400) and everything else
    /// collapses into 500.
    pub fn proxy_status(&self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::QuotaExhausted => 402,
            Self::InvalidRequest => 400,
            _ => 500,
        }
    }

    /// Fixed user-facing message for upstream failures.
    ///
    /// Returns `None` for classes whose own error text is shown instead
    /// (configuration and request errors).
    pub fn public_message(&self) -> Option<&'static str> {
        match self {
            Self::RateLimited => Some("Rate limit exceeded. Please try again later."),
            Self::QuotaExhausted => Some("Usage limit reached. Please add credits."),
            Self::Timeout => Some("AI service timed out"),
            Self::InvalidRequest | Self::Configuration => None,
            _ => Some("AI service error"),
        }
    }
}

impl fmt::Display for StandardErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
