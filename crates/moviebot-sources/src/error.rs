use thiserror::Error;

/// Longest slice of an error body kept for logs and error messages
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Failure talking to the metadata API. Never retried.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("metadata API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("metadata API request timed out")]
    Timeout,
    #[error("metadata API request failed: {0}")]
    Transport(String),
    #[error("metadata API returned an unexpected payload: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn status(status: u16, body: &str) -> Self {
        UpstreamError::Status {
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Timeout)
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_body_is_truncated() {
        let body = "x".repeat(500);
        match UpstreamError::status(401, &body) {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display_includes_status() {
        let err = UpstreamError::status(404, "{\"status_message\":\"not found\"}");
        assert!(err.to_string().contains("404"));
        assert!(!err.is_timeout());
        assert!(UpstreamError::Timeout.is_timeout());
    }
}
