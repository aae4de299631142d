use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Failure of a single API call.
///
/// `Unauthorized` and `Rejected` display exactly the message the backend sent
/// in its `{"error": "..."}` payload, or the operation's fallback message when
/// the payload is missing or unparseable.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build the error for a non-success response.
    ///
    /// Uses the `error` field of a JSON body when present and non-empty,
    /// otherwise `fallback`.
    pub fn from_status(status: StatusCode, body: &str, fallback: &str) -> Self {
        let message = serde_json::from_str::<ErrorPayload>(body)
            .ok()
            .and_then(|p| p.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string());

        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized(message)
        } else {
            ApiError::Rejected { status, message }
        }
    }

    /// True when the backend no longer accepts the credential.
    /// Callers should clear the session and ask the user to log in again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            ApiError::InvalidResponse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_uses_payload_message() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Domain already exists"}"#,
            "Failed to add website",
        );
        assert_eq!(err.to_string(), "Domain already exists");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_from_status_falls_back() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>oops</html>", "Login failed");
        assert_eq!(err.to_string(), "Login failed");

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "", "Login failed");
        assert_eq!(err.to_string(), "Login failed");

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":""}"#, "Login failed");
        assert_eq!(err.to_string(), "Login failed");

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"message":"x"}"#, "Login failed");
        assert_eq!(err.to_string(), "Login failed");
    }

    #[test]
    fn test_401_is_unauthorized() {
        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"error":"Invalid credentials"}"#,
            "Login failed",
        );
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(ApiError::truncate_body(short), short);

        let long = "x".repeat(600);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(500)));
        assert!(truncated.contains("600 total bytes"));
    }
}
