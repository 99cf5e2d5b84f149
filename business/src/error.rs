use std::fmt;

use thiserror::Error;
use ustr::Ustr;

/// Errors raised by table state operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("page size must be greater than zero")]
    InvalidPageSize,
    #[error("unknown column: {0}")]
    UnknownColumn(Ustr),
}

/// The server side of a failed request, when there was one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,
    /// `detail` field of the JSON error body.
    pub detail: Option<String>,
}

/// A failed fetch, as surfaced in the table's error row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub message: String,
    pub response: Option<ErrorResponse>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }

    /// A failure the server answered, with the parsed `detail` if any.
    pub fn with_response(message: impl Into<String>, status: u16, detail: Option<String>) -> Self {
        Self {
            message: message.into(),
            response: Some(ErrorResponse { status, detail }),
        }
    }

    /// HTTP status of the response, when there was one.
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|response| response.status)
    }

    /// The server's `detail` when present, otherwise the transport message.
    pub fn display_message(&self) -> &str {
        self.response
            .as_ref()
            .and_then(|response| response.detail.as_deref())
            .unwrap_or(&self.message)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_message())
    }
}

impl std::error::Error for FetchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefers_response_detail() {
        let err = FetchError::with_response(
            "Request failed with status 403",
            403,
            Some("You do not have access to this fund.".to_owned()),
        );

        assert_eq!(err.display_message(), "You do not have access to this fund.");
        assert_eq!(err.to_string(), "You do not have access to this fund.");
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn display_falls_back_to_message() {
        let err = FetchError::with_response("Request failed with status 500", 500, None);
        assert_eq!(err.display_message(), "Request failed with status 500");

        let err = FetchError::new("Network Error");
        assert_eq!(err.display_message(), "Network Error");
        assert_eq!(err.status(), None);
    }
}
