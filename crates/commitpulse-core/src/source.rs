use crate::{Repository, RepositorySeries, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub committed_at: DateTime<Utc>,
}

impl CommitRecord {
    pub fn new(sha: impl Into<String>, committed_at: DateTime<Utc>) -> Self {
        Self {
            sha: sha.into(),
            committed_at,
        }
    }
}

/// One response of the commit-listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitPage {
    /// Newest-first commits at or before the requested `until`. May be empty.
    Commits(Vec<CommitRecord>),
    /// A successful response whose body was not a commit list.
    Malformed(String),
}

impl CommitPage {
    pub fn empty() -> Self {
        CommitPage::Commits(Vec::new())
    }
}

/// Lists the repositories of an organization.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn list_repositories(&self, organization: &str) -> Result<Vec<Repository>>;
}

/// Fetches one page of a repository's commit history.
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn fetch_commits(&self, repo: &Repository, until: DateTime<Utc>) -> Result<CommitPage>;
}

/// Persists finished series.
#[async_trait]
pub trait SeriesSink: Send + Sync {
    /// Returns the location the series was written to.
    async fn write_series(&self, series: &RepositorySeries) -> Result<PathBuf>;
}
