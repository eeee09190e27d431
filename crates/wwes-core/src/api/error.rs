use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Key pair rejected: {0}")]
    AuthFailure(String),

    #[error("Unauthorized - key may be expired or lack access")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
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

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AuthFailure(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Map an error code carried inside a remote document.
    /// Codes in the 200 range are credential problems (bad key, wrong
    /// access mask, expired key) and let the caller move to the next pair.
    pub fn from_remote(code: i64, message: &str) -> Self {
        match code {
            200..=299 => ApiError::AuthFailure(format!("{}: {}", code, message)),
            _ => ApiError::Remote {
                code,
                message: Self::truncate_body(message),
            },
        }
    }

    /// Whether this error means the credential pair should be skipped
    /// rather than aborting the whole run.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, ApiError::AuthFailure(_) | ApiError::Unauthorized)
    }
}
