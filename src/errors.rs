use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Failed to parse request: {0}")]
    ParseError(String),

    #[error("Failed to access AI provider: {0}")]
    ProviderError(String),

    #[error("Failed to access LINE API: {0}")]
    LineApiError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl From<reqwest::Error> for AlertError {
    fn from(error: reqwest::Error) -> Self {
        AlertError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for AlertError {
    fn from(error: serde_json::Error) -> Self {
        AlertError::ParseError(error.to_string())
    }
}

impl From<anyhow::Error> for AlertError {
    fn from(error: anyhow::Error) -> Self {
        AlertError::GeneralError(error.to_string())
    }
}
