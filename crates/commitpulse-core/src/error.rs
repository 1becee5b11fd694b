use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Repository listing failed: {0}")]
    ListingFailed(String),

    #[error("No commit history returned for {repository}: {reason}")]
    RepositoryExhaustedWithNoData { repository: String, reason: String },

    #[error("GitHub rate limit exceeded{}", reset_suffix(.reset_at))]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("Commit fetch failed{}: {message}", status_suffix(.status))]
    FetchFailed { status: Option<u16>, message: String },

    #[error("Failed to write series for {repository}: {reason}")]
    WriteFailed { repository: String, reason: String },

    #[error("History walk for {repository} timed out after {}s", .after.as_secs())]
    TimedOut { repository: String, after: Duration },

    #[error("History walk for {0} ended without reporting a result")]
    TaskAborted(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn reset_suffix(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => format!(" (resets at {})", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => String::new(),
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
