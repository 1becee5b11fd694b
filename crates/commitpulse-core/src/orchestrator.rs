use crate::{
    paginator::HistoryPaginator,
    source::{CommitSource, SeriesSink},
    Error, Repository, RepositorySeries, Result,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on simultaneously running history walks.
    pub max_concurrent_walks: usize,
    pub walk_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_walks: 8,
            walk_timeout: None,
        }
    }
}

/// Persisted result of one repository.
#[derive(Debug, Clone)]
pub struct WrittenSeries {
    pub repository: String,
    pub path: PathBuf,
    pub days: usize,
    pub total_commits: u64,
}

#[derive(Debug)]
pub struct FailedRepository {
    pub repository: String,
    pub error: Error,
}

/// Outcome of a whole run, in completion order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: Vec<WrittenSeries>,
    pub failed: Vec<FailedRepository>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs one history walk per repository and persists each finished series
/// as soon as it arrives.
pub struct Orchestrator {
    source: Arc<dyn CommitSource>,
    sink: Arc<dyn SeriesSink>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn CommitSource>,
        sink: Arc<dyn SeriesSink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    pub async fn run(&self, repositories: Vec<Repository>) -> RunSummary {
        self.run_at(repositories, Utc::now()).await
    }

    /// Same as [`run`](Self::run) with an explicit starting cursor.
    pub async fn run_at(&self, repositories: Vec<Repository>, now: DateTime<Utc>) -> RunSummary {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_walks.max(1)));
        let (tx, mut rx) = mpsc::unbounded_channel::<(String, Result<RepositorySeries>)>();
        let mut pending: BTreeSet<String> = BTreeSet::new();

        tracing::info!(
            "Walking {} repositories ({} at a time)",
            repositories.len(),
            self.config.max_concurrent_walks.max(1)
        );

        for repo in repositories {
            if !pending.insert(repo.name.clone()) {
                tracing::warn!("Skipping duplicate repository name: {}", repo.name);
                continue;
            }

            let source = self.source.clone();
            let permits = permits.clone();
            let tx = tx.clone();
            let timeout = self.config.walk_timeout;

            tokio::spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => walk_repository(source.as_ref(), &repo, now, timeout).await,
                    Err(_) => Err(Error::TaskAborted(repo.name.clone())),
                };
                let _ = tx.send((repo.name, result));
            });
        }
        drop(tx);

        let mut summary = RunSummary::default();

        while let Some((name, result)) = rx.recv().await {
            pending.remove(&name);
            self.persist(name, result, &mut summary).await;
        }

        // Tasks that panicked drop their sender without reporting.
        for name in pending {
            tracing::error!("History walk for {} never reported back", name);
            summary.failed.push(FailedRepository {
                error: Error::TaskAborted(name.clone()),
                repository: name,
            });
        }

        tracing::info!(
            "Run finished: {} succeeded, {} failed",
            summary.succeeded.len(),
            summary.failed.len()
        );

        summary
    }

    async fn persist(&self, name: String, result: Result<RepositorySeries>, summary: &mut RunSummary) {
        let series = match result {
            Ok(series) => series,
            Err(error) => {
                tracing::warn!("Repository {} failed: {}", name, error);
                summary.failed.push(FailedRepository {
                    repository: name,
                    error,
                });
                return;
            }
        };

        match self.sink.write_series(&series).await {
            Ok(path) => {
                tracing::info!("✓ Wrote {} days for {} to {}", series.len(), name, path.display());
                summary.succeeded.push(WrittenSeries {
                    repository: name,
                    path,
                    days: series.len(),
                    total_commits: series.total_commits(),
                });
            }
            Err(error) => {
                tracing::error!("Failed to persist {}: {}", name, error);
                summary.failed.push(FailedRepository {
                    repository: name,
                    error,
                });
            }
        }
    }
}

async fn walk_repository(
    source: &dyn CommitSource,
    repo: &Repository,
    now: DateTime<Utc>,
    timeout: Option<Duration>,
) -> Result<RepositorySeries> {
    let walk = HistoryPaginator::new(source, repo, now).walk();

    match timeout {
        Some(after) => tokio::time::timeout(after, walk)
            .await
            .unwrap_or_else(|_| {
                Err(Error::TimedOut {
                    repository: repo.name.clone(),
                    after,
                })
            }),
        None => walk.await,
    }
}
