pub mod bucket;
pub mod error;
pub mod orchestrator;
pub mod paginator;
pub mod repository;
pub mod series;
pub mod source;

// Re-exports
pub use bucket::DayBuckets;
pub use error::{Error, Result};
pub use orchestrator::{FailedRepository, Orchestrator, OrchestratorConfig, RunSummary, WrittenSeries};
pub use paginator::HistoryPaginator;
pub use repository::Repository;
pub use series::{DailyCount, DayAccumulator, RepositorySeries, DAY_FORMAT};
pub use source::{CommitPage, CommitRecord, CommitSource, RepositorySource, SeriesSink};
