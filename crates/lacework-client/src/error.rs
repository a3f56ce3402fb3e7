//! Error types for the Lacework API client.

use thiserror::Error;

/// Errors raised by [`crate::LaceworkClient`] operations.
///
/// The MCP tool layer converts every variant into a structured
/// `{error, details?}` result; nothing here crosses the host protocol as a
/// failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Token acquisition failed, or the token response was malformed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The upstream API answered with an error status.
    ///
    /// Carries the raw response body so callers can always inspect what the
    /// API actually said.
    #[error("HTTP {status}")]
    Http {
        /// HTTP status code (always ≥ 400).
        status: u16,
        /// Raw response body, unparsed.
        body: String,
    },

    /// Transport-level failure: DNS, TLS, connect, or request timeout.
    ///
    /// Typically retryable; GETs are retried automatically at the transport
    /// layer, POSTs are not.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Failure raised inside the retry middleware stack.
    #[error("middleware error: {0}")]
    Middleware(reqwest_middleware::Error),

    /// The caller supplied invalid arguments.
    #[error("{0}")]
    Validation(String),

    /// Request or response JSON could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client construction problem: bad base URL, unreadable CA bundle.
    #[error("configuration error: {0}")]
    Configuration(String),
}

// Unwrap the reqwest case so transport failures classify uniformly whether
// the request went through the middleware stack or not.
impl From<reqwest_middleware::Error> for ClientError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(inner) => Self::Transport(inner),
            other => Self::Middleware(other),
        }
    }
}

impl ClientError {
    /// The raw upstream response body, when this error carries one.
    ///
    /// The tool layer uses this to fill the `details` field of its
    /// structured error result.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The upstream HTTP status, when this error carries one.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether retrying the same call could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Middleware(_))
    }
}
