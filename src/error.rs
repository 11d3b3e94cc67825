use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AdLensError {
    // Network errors
    #[error("Network timeout: {0}")]
    Timeout(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: retry after {0}s")]
    RateLimited(u64),

    #[error("Session rejected: the service answered with a login page instead of data")]
    LoginRequired,

    #[error("Network error: {0}")]
    NetworkError(String),

    // Parse errors
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    ValidationError(String),

    // IO errors
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<wreq::Error> for AdLensError {
    fn from(err: wreq::Error) -> Self {
        if err.is_timeout() {
            AdLensError::Timeout(err.to_string())
        } else if err.is_connect() {
            AdLensError::NetworkError(format!("Connection failed: {}", err))
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                401 | 403 => AdLensError::Unauthorized(err.to_string()),
                429 => AdLensError::RateLimited(60), // Default retry after 60s
                _ => AdLensError::NetworkError(err.to_string()),
            }
        } else {
            AdLensError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AdLensError {
    fn from(err: serde_json::Error) -> Self {
        AdLensError::InvalidJson(err.to_string())
    }
}

impl From<url::ParseError> for AdLensError {
    fn from(err: url::ParseError) -> Self {
        AdLensError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for AdLensError {
    fn from(err: std::io::Error) -> Self {
        AdLensError::IoError(err.to_string())
    }
}

/// Type alias for Result with AdLensError
pub type Result<T> = std::result::Result<T, AdLensError>;
