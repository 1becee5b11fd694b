use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("GitHub rate limit exceeded")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Octocrab error: {0}")]
    Octocrab(#[from] octocrab::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for commitpulse_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::RateLimited { reset_at } => commitpulse_core::Error::RateLimited { reset_at },
            Error::ApiError { status, message } => commitpulse_core::Error::FetchFailed {
                status: Some(status),
                message,
            },
            Error::Request(e) => commitpulse_core::Error::FetchFailed {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            other => commitpulse_core::Error::FetchFailed {
                status: None,
                message: other.to_string(),
            },
        }
    }
}
