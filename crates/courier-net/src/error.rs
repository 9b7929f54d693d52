//! Error types for the request pipeline.

use thiserror::Error;

use crate::http::RetCode;

/// Rejection text for an expired session. Fixed regardless of the server message.
pub const SESSION_EXPIRED_MESSAGE: &str = "login session has expired, please log in again";

/// Rejection text when no response object was obtained.
pub const NO_RESPONSE_MESSAGE: &str = "request failed";

/// Rejection text for a non-200 HTTP status.
pub const STATUS_ERROR_MESSAGE: &str = "interface exception";

/// Everything that can reject a pipeline call.
///
/// Every variant except [`PipelineError::NoResponse`] and the local usage
/// errors (`InvalidUrl`, `InvalidHeader`, `Config`, `UnexpectedPayload`) has
/// already been shown to the user through the notification presenter by the
/// time the caller sees it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The classifier was handed no response at all.
    #[error("request failed")]
    NoResponse,

    /// The request never produced a response (connection, DNS, TLS, timeout).
    ///
    /// The original `reqwest` error is kept as the source.
    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a status outside the accepted range.
    #[error("Request failed with status code {status}")]
    UnacceptedStatus {
        /// The HTTP status code.
        status: u16,
    },

    /// The server answered with an accepted status other than 200.
    #[error("interface exception (HTTP {status})")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },

    /// Business code 401 or 403.
    #[error("{0}")]
    SessionExpired(String),

    /// Any other non-success business code.
    #[error("{message}")]
    Business {
        /// The business code, if the envelope carried one.
        code: Option<RetCode>,
        /// Server-supplied message or a default.
        message: String,
    },

    /// A declared-binary body could not be read.
    #[error("failed to read binary body: {0}")]
    BlobDecode(String),

    /// Invalid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid header name or value.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Saving a download failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The call resolved, but not with the payload shape the caller asked for.
    #[error("unexpected payload: expected {expected}, got {actual}")]
    UnexpectedPayload {
        /// What the caller asked for.
        expected: &'static str,
        /// What the pipeline resolved with.
        actual: &'static str,
    },
}

impl PipelineError {
    /// Whether the failure happened before any response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NoResponse | Self::Transport(_) | Self::UnacceptedStatus { .. }
        )
    }

    /// Whether the transmission timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Whether the connection could not be established.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }

    /// Whether the caller should send the user back to authentication.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }

    /// HTTP status attached to the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnacceptedStatus { status } | Self::HttpStatus { status } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<http::header::InvalidHeaderName> for PipelineError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for PipelineError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// A specialized Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(PipelineError::NoResponse.to_string(), NO_RESPONSE_MESSAGE);
        assert_eq!(
            PipelineError::HttpStatus { status: 404 }.to_string(),
            format!("{STATUS_ERROR_MESSAGE} (HTTP 404)")
        );
        assert_eq!(
            PipelineError::SessionExpired(SESSION_EXPIRED_MESSAGE.to_string()).to_string(),
            SESSION_EXPIRED_MESSAGE
        );
        assert_eq!(
            PipelineError::Business {
                code: Some(RetCode::Number(500)),
                message: "boom".to_string()
            }
            .to_string(),
            "boom"
        );
    }

    #[test]
    fn test_classification_helpers() {
        assert!(PipelineError::NoResponse.is_transport());
        assert!(PipelineError::UnacceptedStatus { status: 503 }.is_transport());
        assert!(!PipelineError::HttpStatus { status: 500 }.is_transport());
        assert_eq!(PipelineError::HttpStatus { status: 500 }.status(), Some(500));
        assert!(PipelineError::SessionExpired(String::new()).is_session_expired());
        assert!(!PipelineError::BlobDecode("eof".into()).is_timeout());
    }
}
