use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for resolver list operations
pub type Result<T> = std::result::Result<T, DnsdirError>;

/// Errors that can occur while fetching, rendering or writing resolver lists
#[derive(Error, Debug)]
pub enum DnsdirError {
    /// Authentication failed - upstream rejected the API key
    #[error("authentication failed: upstream rejected the API key")]
    Unauthorized,

    /// Rate limit exceeded
    #[error("rate limit exceeded, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying
        retry_after: Option<u64>,
    },

    /// Upstream returned an error response
    #[error("API error ({code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from the API
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Connection failed
    #[error("connection failed: {0}")]
    Connection(String),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Upstream answered with something that is not a resolver page
    #[error("malformed upstream payload: {0}")]
    MalformedPayload(String),

    /// Upstream answered, but not a single usable record came back
    #[error("upstream returned no usable resolver records")]
    EmptyRecordSet,

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Country or continent code that cannot name an output file
    #[error("invalid region code: {0:?}")]
    InvalidCode(String),

    /// A snapshot file could not be read
    #[error("failed to read snapshot {path}: {source}")]
    Snapshot {
        /// Snapshot path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// An output could not be rendered
    #[error("failed to render {path}: {message}")]
    Render {
        /// Relative output path
        path: String,
        /// What went wrong
        message: String,
    },

    /// An output could not be written or swapped into place
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl DnsdirError {
    /// Returns true if the request that produced this error may be retried
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Connection(_) => true,
            Self::Api { code, .. } => *code >= 500,
            _ => false,
        }
    }

    /// Returns true if the error happened while obtaining the record set.
    ///
    /// Fetch errors abort a run before any output is touched.
    #[must_use]
    pub const fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized
                | Self::RateLimited { .. }
                | Self::Api { .. }
                | Self::Http(_)
                | Self::Timeout(_)
                | Self::Connection(_)
                | Self::Json(_)
                | Self::MalformedPayload(_)
                | Self::EmptyRecordSet
                | Self::Snapshot { .. }
        )
    }

    /// Returns true if the error is due to authentication
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns the HTTP status code if this is an API error
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::RateLimited { .. } => Some(429),
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
