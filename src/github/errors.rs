//! GitHub API Error Types
//!
//! Structured error handling for contents-API operations.
//! Maps HTTP status codes to specific variants so callers can tell a
//! conflicting write from an expired session.

/// GitHub API error types
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("Login expired, re-authentication required")]
    AuthExpired,

    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Remote error ({0}): {1}")]
    Remote(u16, String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GithubError {
    /// Create a GithubError from an HTTP status code and the server's message.
    ///
    /// GitHub reports both a stale sha and a create colliding with an
    /// existing path as 409/422, so both map to WriteConflict.
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            401 => GithubError::AuthExpired,
            404 => GithubError::NotFound(message.to_string()),
            409 | 422 => GithubError::WriteConflict(message.to_string()),
            _ => GithubError::Remote(status, message.to_string()),
        }
    }
}

impl From<reqwest::Error> for GithubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GithubError::Decode(err.to_string())
        } else {
            GithubError::Network(err.to_string())
        }
    }
}
