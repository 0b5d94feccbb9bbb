//! Error types for GitHub API operations.

use thiserror::Error;

/// Errors that can occur during GitHub API operations.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The request could not be described (no target, malformed URL, bad env).
    #[error("GitHub configuration error: {0}")]
    Configuration(String),

    /// Response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Payload content could not be decoded (e.g. invalid base64).
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The addressed resource does not exist.
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    /// API request failed with a non-success status.
    #[error("GitHub API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// A GraphQL response carried errors or no data.
    #[error("GraphQL request failed by: {0}")]
    GraphQl(String),

    /// An entity was used in a way its lifecycle forbids.
    #[error("Programming contract violated: {0}")]
    Design(String),

    /// A lazy sequence was reconfigured after it started fetching.
    #[error("Invalid state: {0}")]
    State(String),
}

impl GitHubError {
    /// HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => *status_code,
            Self::NotFound { .. } => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for GitHub operations.
pub type Result<T> = core::result::Result<T, GitHubError>;
