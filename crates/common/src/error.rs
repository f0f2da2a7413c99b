use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single request attempt against the quote service.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("quote service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

impl TransportError {
    /// Malformed bodies end the fetch immediately; everything else is
    /// retried while the attempt budget lasts.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::MalformedBody(_))
    }
}

/// Terminal fetch failure, carrying the last attempt's cause.
#[derive(Error, Debug)]
#[error("quote service request failed after {attempts} attempt(s): {cause}")]
pub struct ApiError {
    pub attempts: u32,
    #[source]
    pub cause: TransportError,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
