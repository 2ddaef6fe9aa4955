//! Error taxonomy for the Home Assistant API client.
//!
//! # Design
//! Every failure of an operation is an `ApiError`: a message, the HTTP status
//! that caused it (0 when no response was obtained), and an optional raw body
//! for debugging. The status is folded into a closed `ErrorKind` so callers
//! can `match` exhaustively instead of re-parsing messages.
//!
//! Status 408 is produced by the client-side deadline; a server-emitted 408
//! classifies the same way.

use std::time::Duration;

use thiserror::Error;

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 401: the access token was rejected.
    Authentication,
    /// 404: the entity, calendar or endpoint does not exist.
    NotFound,
    /// 408: the request did not complete within the configured deadline.
    Timeout,
    /// 0: no HTTP response was obtained (DNS, refused connection, TLS).
    Network,
    /// A 2xx response whose body did not match the expected shape.
    Decode,
    /// Any other non-2xx status.
    Unclassified,
}

impl ErrorKind {
    /// Classify an HTTP status code. `Decode` is never produced here.
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => ErrorKind::Network,
            401 => ErrorKind::Authentication,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            _ => ErrorKind::Unclassified,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::Decode => "decode",
            ErrorKind::Unclassified => "unclassified",
        }
    }
}

/// A classified failure of a single API operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    status: u16,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    /// A non-2xx response. `reason` is the canonical reason phrase (may be
    /// empty) and `body` the response text, kept as the detail.
    pub fn from_status(status: u16, reason: &str, body: impl Into<String>) -> Self {
        let message = if reason.is_empty() {
            format!("API request failed: {status}")
        } else {
            format!("API request failed: {status} {reason}")
        };
        Self {
            kind: ErrorKind::from_status(status),
            status,
            message,
            detail: Some(body.into()),
        }
    }

    /// The client-side deadline elapsed before a response arrived.
    pub fn timeout(after: Duration) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            status: 408,
            message: format!("Request timeout after {}ms", after.as_millis()),
            detail: Some("Request timed out".to_string()),
        }
    }

    /// No response was obtained. The transport message is both message
    /// suffix and detail.
    pub fn network(cause: impl Into<String>) -> Self {
        let cause = cause.into();
        Self {
            kind: ErrorKind::Network,
            status: 0,
            message: format!("Network error: {cause}"),
            detail: Some(cause),
        }
    }

    /// A successful response carried a body of the wrong shape.
    pub fn decode(cause: impl Into<String>) -> Self {
        let cause = cause.into();
        Self {
            kind: ErrorKind::Decode,
            status: 0,
            message: format!("Failed to decode response: {cause}"),
            detail: Some(cause),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status, 408 for the client deadline, 0 when there was no response.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_auth_error(&self) -> bool {
        self.kind == ErrorKind::Authentication
    }

    pub fn is_not_found_error(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_timeout_error(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn is_network_error(&self) -> bool {
        self.kind == ErrorKind::Network
    }
}

/// Transport failures from the HTTP stack. Deadline expiry is handled by the
/// executor before this conversion is reached.
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::network(err.to_string())
    }
}

/// Errors raised while building or validating a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("configuration is invalid: {}", .0.join(", "))]
    Rejected(Vec<String>),

    #[error("failed to initialise HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUSES: [u16; 9] = [0, 200, 400, 401, 403, 404, 408, 500, 503];

    #[test]
    fn classification_is_exclusive() {
        for status in STATUSES {
            let err = ApiError::from_status(status, "", "body");
            let flags = [
                err.is_auth_error(),
                err.is_not_found_error(),
                err.is_timeout_error(),
                err.is_network_error(),
            ];
            let set = flags.iter().filter(|f| **f).count();
            match status {
                0 | 401 | 404 | 408 => assert_eq!(set, 1, "status {status}"),
                _ => assert_eq!(set, 0, "status {status}"),
            }
        }
    }

    #[test]
    fn from_status_keeps_body_as_detail() {
        let err = ApiError::from_status(500, "Internal Server Error", "boom");
        assert_eq!(err.status(), 500);
        assert_eq!(err.kind(), ErrorKind::Unclassified);
        assert_eq!(err.message(), "API request failed: 500 Internal Server Error");
        assert_eq!(err.detail(), Some("boom"));
    }

    #[test]
    fn unauthorized_is_auth_error() {
        let err = ApiError::from_status(401, "Unauthorized", "401: Unauthorized");
        assert!(err.is_auth_error());
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn timeout_reports_configured_duration() {
        let err = ApiError::timeout(Duration::from_millis(2500));
        assert_eq!(err.status(), 408);
        assert!(err.is_timeout_error());
        assert_eq!(err.to_string(), "Request timeout after 2500ms");
        assert_eq!(err.detail(), Some("Request timed out"));
    }

    #[test]
    fn network_error_has_status_zero() {
        let err = ApiError::network("connection refused");
        assert_eq!(err.status(), 0);
        assert!(err.is_network_error());
        assert_eq!(err.message(), "Network error: connection refused");
        assert_eq!(err.detail(), Some("connection refused"));
    }

    #[test]
    fn decode_error_is_not_a_network_error() {
        let err = ApiError::decode("expected value at line 1 column 1");
        assert_eq!(err.status(), 0);
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(!err.is_network_error());
    }
}
