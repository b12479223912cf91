use thiserror::Error;

/// Application-wide error types for ferret.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (non-success status, bad URL, unreadable body).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The fetched document could not be treated as HTML text.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The crawl request or runtime configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A recognition rule failed to compile.
    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true for the transport-level failures a Fetcher can report.
    ///
    /// These are scoped to a single URL: the controller marks the URL as
    /// skipped and keeps crawling.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_) | AppError::NetworkError(_) | AppError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failures() {
        assert!(AppError::NetworkError("reset".into()).is_fetch_failure());
        assert!(AppError::Timeout(30).is_fetch_failure());
        assert!(AppError::HttpError("HTTP 404".into()).is_fetch_failure());
        assert!(!AppError::ParseError("empty body".into()).is_fetch_failure());
        assert!(!AppError::ConfigError("no seeds".into()).is_fetch_failure());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AppError::ConfigError("seed list is empty".into()).to_string(),
            "Configuration error: seed list is empty"
        );
        assert_eq!(
            AppError::Timeout(10).to_string(),
            "Request timed out after 10 seconds"
        );
    }
}
