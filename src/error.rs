use thiserror::Error;

/// How a provider failure should be treated by callers that retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The addressed resource does not exist. Never retried.
    NotFound,
    /// Rate limiting or a 5xx response.
    Retryable,
    /// Any other 4xx response (bad request, auth). Never retried.
    Permanent,
    /// Transport failures and responses we could not make sense of.
    Other,
}

/// Failure reported by one of the external providers (search, generation, calendar).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("resource not found")]
    NotFound,

    #[error("provider responded with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if status == 404 {
            ProviderError::NotFound
        } else {
            ProviderError::Status {
                status,
                message: message.into(),
            }
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ProviderError::NotFound => ErrorClass::NotFound,
            ProviderError::Status { status, .. } if *status == 429 || (500..600).contains(status) => {
                ErrorClass::Retryable
            }
            ProviderError::Status { .. } => ErrorClass::Permanent,
            ProviderError::Transport(_) | ProviderError::InvalidResponse(_) => ErrorClass::Other,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ProviderError::from_status(status.as_u16(), err.to_string()),
            None => ProviderError::Transport(err.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("{operation} failed: {source}")]
    Provider {
        operation: String,
        #[source]
        source: ProviderError,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl CollectorError {
    pub fn provider(operation: impl Into<String>, source: ProviderError) -> Self {
        CollectorError::Provider {
            operation: operation.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CollectorError>;
