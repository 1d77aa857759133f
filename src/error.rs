use std::time::Duration;
use thiserror::Error;

/// Failures of the admission gate itself. Errors coming out of a `send`
/// never pass through this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No permit became available within {0:?}")]
    AdmissionTimeout(Duration),

    #[error("Interrupted while waiting for rate limit")]
    Interrupted,

    #[error("Admission controller has been shut down")]
    Shutdown,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Admission error: {0}")]
    Admission(#[from] AdmissionError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to serialize document to JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("API request failed with status: {status}. Response: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Initialization error: {0}")]
    Init(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
