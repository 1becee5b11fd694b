use crate::{
    bucket::DayBuckets,
    series::DayAccumulator,
    source::{CommitPage, CommitRecord, CommitSource},
    Error, Repository, RepositorySeries, Result,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

#[derive(Debug)]
enum WalkState {
    Fetching,
    HasPage(Vec<CommitRecord>),
    Drained,
    Exhausted(String),
}

/// Walks one repository's commit history backwards from `now`.
///
/// Each page is requested with `until = cursor`; the cursor then moves to the
/// oldest commit of that page. The walk ends when a page is empty, malformed,
/// or fails to move the cursor.
pub struct HistoryPaginator<'a> {
    source: &'a dyn CommitSource,
    repo: &'a Repository,
    cursor: DateTime<Utc>,
    accumulator: DayAccumulator,
    // `until` is inclusive, so boundary commits come back on the next page.
    seen: HashSet<String>,
    pages: usize,
}

impl<'a> HistoryPaginator<'a> {
    pub fn new(source: &'a dyn CommitSource, repo: &'a Repository, now: DateTime<Utc>) -> Self {
        Self {
            source,
            repo,
            cursor: now,
            accumulator: DayAccumulator::new(),
            seen: HashSet::new(),
            pages: 0,
        }
    }

    /// Run the walk to completion.
    pub async fn walk(mut self) -> Result<RepositorySeries> {
        let mut state = WalkState::Fetching;

        loop {
            state = match state {
                WalkState::Fetching => {
                    tracing::debug!(
                        "Fetching commits for {} until {}",
                        self.repo,
                        self.cursor.to_rfc3339()
                    );

                    match self.source.fetch_commits(self.repo, self.cursor).await? {
                        CommitPage::Commits(commits) if commits.is_empty() => {
                            self.end_of_history("no commits returned".to_string())
                        }
                        CommitPage::Commits(commits) => WalkState::HasPage(commits),
                        CommitPage::Malformed(reason) => {
                            tracing::warn!("Malformed commit page for {}: {}", self.repo, reason);
                            self.end_of_history(reason)
                        }
                    }
                }
                WalkState::HasPage(commits) => self.consume_page(commits),
                WalkState::Drained => {
                    let series = self.accumulator.finalize(self.repo.name.clone());
                    tracing::info!(
                        "Walked {} in {} pages: {} days, {} commits",
                        self.repo,
                        self.pages,
                        series.len(),
                        series.total_commits()
                    );
                    return Ok(series);
                }
                WalkState::Exhausted(reason) => {
                    return Err(Error::RepositoryExhaustedWithNoData {
                        repository: self.repo.name.clone(),
                        reason,
                    });
                }
            };
        }
    }

    fn end_of_history(&self, reason: String) -> WalkState {
        if self.pages == 0 {
            WalkState::Exhausted(reason)
        } else {
            WalkState::Drained
        }
    }

    fn consume_page(&mut self, commits: Vec<CommitRecord>) -> WalkState {
        let page_size = commits.len();
        let seen = &mut self.seen;
        let fresh = commits
            .into_iter()
            .filter(|commit| seen.insert(commit.sha.clone()))
            .map(|commit| commit.committed_at);

        let buckets = DayBuckets::from_timestamps(fresh);
        self.pages += 1;

        let Some(oldest) = buckets.oldest else {
            tracing::debug!(
                "Page of {} commits for {} held nothing new, stopping",
                page_size,
                self.repo
            );
            return WalkState::Drained;
        };

        // Never let a misbehaving source move the cursor forward.
        let oldest = oldest.min(self.cursor);

        self.accumulator
            .add_window(oldest.date_naive(), self.cursor.date_naive(), &buckets.counts);

        if oldest == self.cursor {
            tracing::debug!("Cursor for {} did not move, history drained", self.repo);
            return WalkState::Drained;
        }

        self.cursor = oldest;
        WalkState::Fetching
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::Mutex;

    /// Serves pages out of a fixed newest-first commit list, honouring
    /// `until` inclusively like the GitHub API does.
    struct FakeHistory {
        commits: Vec<CommitRecord>,
        page_size: usize,
        requests: Mutex<Vec<DateTime<Utc>>>,
    }

    impl FakeHistory {
        fn new(mut commits: Vec<CommitRecord>, page_size: usize) -> Self {
            commits.sort_by(|a, b| b.committed_at.cmp(&a.committed_at));
            Self {
                commits,
                page_size,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<DateTime<Utc>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommitSource for FakeHistory {
        async fn fetch_commits(&self, _repo: &Repository, until: DateTime<Utc>) -> Result<CommitPage> {
            self.requests.lock().unwrap().push(until);
            Ok(CommitPage::Commits(
                self.commits
                    .iter()
                    .filter(|c| c.committed_at <= until)
                    .take(self.page_size)
                    .cloned()
                    .collect(),
            ))
        }
    }

    struct FixedPage(CommitPage);

    #[async_trait]
    impl CommitSource for FixedPage {
        async fn fetch_commits(&self, _repo: &Repository, _until: DateTime<Utc>) -> Result<CommitPage> {
            Ok(self.0.clone())
        }
    }

    fn repo() -> Repository {
        Repository::from_full_name("http://localhost", "exercism/rust")
    }

    fn commit(sha: &str, y: i32, m: u32, d: u32, h: u32) -> CommitRecord {
        CommitRecord::new(sha, Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 7, 23, 59, 59).unwrap()
    }

    #[tokio::test]
    async fn test_single_page_history_is_gap_filled() {
        let source = FakeHistory::new(
            vec![
                commit("a", 2024, 1, 5, 9),
                commit("b", 2024, 1, 5, 10),
                commit("c", 2024, 1, 5, 11),
                commit("d", 2024, 1, 7, 12),
            ],
            100,
        );
        let repo = repo();

        let series = HistoryPaginator::new(&source, &repo, now()).walk().await.unwrap();

        let days: Vec<(String, u64)> = series
            .days()
            .iter()
            .map(|d| (d.formatted_day(), d.count))
            .collect();
        assert_eq!(
            days,
            vec![
                ("05.01.2024".to_string(), 3),
                ("06.01.2024".to_string(), 0),
                ("07.01.2024".to_string(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_multi_page_walk_counts_each_commit_once() {
        // Two commits per page forces boundary days to be shared between pages.
        let source = FakeHistory::new(
            vec![
                commit("a", 2024, 1, 1, 8),
                commit("b", 2024, 1, 3, 8),
                commit("c", 2024, 1, 3, 9),
                commit("d", 2024, 1, 3, 10),
                commit("e", 2024, 1, 6, 8),
                commit("f", 2024, 1, 7, 8),
            ],
            2,
        );
        let repo = repo();

        let series = HistoryPaginator::new(&source, &repo, now()).walk().await.unwrap();

        assert_eq!(series.total_commits(), 6);
        assert_eq!(series.first_day(), Some(day(2024, 1, 1)));
        assert_eq!(series.last_day(), Some(day(2024, 1, 7)));
        assert_eq!(series.len(), 7);
        assert_eq!(series.days()[2].count, 3);

        // Ascending with no duplicates or gaps.
        for pair in series.days().windows(2) {
            assert_eq!(pair[0].day.succ_opt(), Some(pair[1].day));
        }
    }

    #[tokio::test]
    async fn test_cursor_never_moves_forward() {
        let source = FakeHistory::new(
            (0..10)
                .map(|i| commit(&format!("sha{}", i), 2023, 12, 20 + i, 12))
                .collect(),
            3,
        );
        let repo = repo();

        HistoryPaginator::new(&source, &repo, now()).walk().await.unwrap();

        let requests = source.requests();
        assert!(requests.len() > 1);
        assert_eq!(requests[0], now());
        for pair in requests.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[tokio::test]
    async fn test_page_stuck_on_cursor_terminates() {
        // Three commits share one second and the page only holds two of them,
        // so the cursor can never move past that second.
        let source = FakeHistory::new(
            vec![
                commit("a", 2024, 1, 6, 12),
                commit("b", 2024, 1, 6, 12),
                commit("c", 2024, 1, 6, 12),
                commit("d", 2024, 1, 2, 12),
            ],
            2,
        );
        let repo = repo();

        let series = HistoryPaginator::new(&source, &repo, now()).walk().await.unwrap();

        assert!(source.requests().len() <= 3);
        assert_eq!(series.first_day(), Some(day(2024, 1, 6)));
    }

    #[tokio::test]
    async fn test_empty_repository_is_exhausted() {
        let source = FakeHistory::new(Vec::new(), 100);
        let repo = repo();

        let err = HistoryPaginator::new(&source, &repo, now())
            .walk()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::RepositoryExhaustedWithNoData { ref repository, .. } if repository == "rust"
        ));
    }

    #[tokio::test]
    async fn test_malformed_first_page_is_exhausted() {
        let source = FixedPage(CommitPage::Malformed("expected a JSON array".to_string()));
        let repo = repo();

        let err = HistoryPaginator::new(&source, &repo, now())
            .walk()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RepositoryExhaustedWithNoData { .. }));
    }

    #[tokio::test]
    async fn test_malformed_later_page_drains() {
        struct ThenMalformed {
            calls: Mutex<usize>,
        }

        #[async_trait]
        impl CommitSource for ThenMalformed {
            async fn fetch_commits(&self, _repo: &Repository, _until: DateTime<Utc>) -> Result<CommitPage> {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                if *calls == 1 {
                    Ok(CommitPage::Commits(vec![
                        commit("b", 2024, 1, 7, 8),
                        commit("a", 2024, 1, 6, 8),
                    ]))
                } else {
                    Ok(CommitPage::Malformed("rate limit body".to_string()))
                }
            }
        }

        let source = ThenMalformed {
            calls: Mutex::new(0),
        };
        let repo = repo();

        let series = HistoryPaginator::new(&source, &repo, now()).walk().await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.total_commits(), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_fails_the_walk() {
        struct Failing;

        #[async_trait]
        impl CommitSource for Failing {
            async fn fetch_commits(&self, _repo: &Repository, _until: DateTime<Utc>) -> Result<CommitPage> {
                Err(Error::FetchFailed {
                    status: Some(500),
                    message: "Internal Server Error".to_string(),
                })
            }
        }

        let repo = repo();
        let err = HistoryPaginator::new(&Failing, &repo, now())
            .walk()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::FetchFailed { status: Some(500), .. }));
    }
}
