use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid repository name: {0:?}")]
    InvalidRepositoryName(String),

    #[error("Invalid row {line} in {}: {reason}", .path.display())]
    InvalidRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Result directory does not exist: {}", .0.display())]
    ResultDirMissing(PathBuf),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
