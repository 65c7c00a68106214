//! Error types for ESI resource requests

/// Errors from ESI resource requests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-2xx response. The message is the JSON `error` field when the
    /// body is JSON, otherwise the raw body text.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid JSON body: {0}")]
    Decode(String),

    #[error("expected a JSON body, got: {0}")]
    UnexpectedBody(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// HTTP status of an API failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias for ESI client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_message_only() {
        let err = Error::Api {
            status: 404,
            message: "Type not found!".into(),
        };
        assert_eq!(err.to_string(), "Type not found!");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn non_api_errors_have_no_status() {
        assert_eq!(Error::Http("connection refused".into()).status(), None);
    }
}
