//! Backend service errors and classifications.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    Authentication,
    ContentFilter,
    InvalidRequest,
    InvalidResponse,
    RateLimited,
    Timeout,
    Transport,
    Cancelled,
}

/// A backend-side failure with enough structure for callers to branch on:
/// the kind, the HTTP status when one exists, and the service's own error
/// code when it reported one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
    pub status: Option<u16>,
    pub code: Option<String>,
    pub retryable: bool,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            code: None,
            retryable,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Authentication, message, false)
    }

    pub fn content_filter(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::ContentFilter, message, false)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::InvalidRequest, message, false)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::InvalidResponse, message, false)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::RateLimited, message, true)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Transport, message, true)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Cancelled, message, false)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ClientErrorKind::Cancelled
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.status, &self.code) {
            (Some(status), Some(code)) => write!(
                f,
                "{:?} [status={}, code={}]: {}",
                self.kind, status, code, self.message
            ),
            (Some(status), None) => {
                write!(f, "{:?} [status={}]: {}", self.kind, status, self.message)
            }
            _ => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ClientError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_constructors_assign_kind_and_retryability() {
        let auth = ClientError::authentication("bad key");
        assert_eq!(auth.kind, ClientErrorKind::Authentication);
        assert!(!auth.retryable);

        let limited = ClientError::rate_limited("slow down");
        assert_eq!(limited.kind, ClientErrorKind::RateLimited);
        assert!(limited.retryable);

        assert!(ClientError::cancelled("stopped").is_cancelled());
    }

    #[test]
    fn display_includes_status_and_service_code() {
        let error = ClientError::invalid_request("bad payload")
            .with_status(400)
            .with_code("invalid_schema");

        let rendered = error.to_string();
        assert!(rendered.contains("400"));
        assert!(rendered.contains("invalid_schema"));
        assert!(rendered.contains("bad payload"));
    }
}
