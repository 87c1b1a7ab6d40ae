use thiserror::Error;

use shared_error::AppError;

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Catalogue API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CatalogueError {
    /// Transient failures are worth one retry: network errors, timeouts,
    /// rate limits and server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogueError::RequestError(e) => e.is_timeout() || e.is_connect(),
            CatalogueError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<CatalogueError> for AppError {
    fn from(err: CatalogueError) -> Self {
        match err {
            CatalogueError::NotFound(msg) => AppError::NotFound(msg),
            CatalogueError::ConfigError(msg) => AppError::ConfigError(msg),
            other => AppError::Database(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogueError>;
