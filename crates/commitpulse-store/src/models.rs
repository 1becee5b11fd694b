use chrono::NaiveDate;
use commitpulse_core::{DailyCount, RepositorySeries, DAY_FORMAT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the per-repository series under `<result dir>/<repo>/`.
pub const SERIES_FILE_NAME: &str = "commit_count.csv";

pub const CSV_HEADER: [&str; 2] = ["date", "commit_count"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    pub date: String,
    pub commit_count: u64,
}

impl From<&DailyCount> for CsvRow {
    fn from(daily: &DailyCount) -> Self {
        Self {
            date: daily.formatted_day(),
            commit_count: daily.count,
        }
    }
}

impl CsvRow {
    pub fn to_daily_count(&self) -> Option<DailyCount> {
        NaiveDate::parse_from_str(self.date.trim(), DAY_FORMAT)
            .ok()
            .map(|day| DailyCount::new(day, self.commit_count))
    }
}

/// One repository directory found under the result root.
#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub repository: String,
    pub path: PathBuf,
    pub status: EntryStatus,
}

#[derive(Debug, Clone)]
pub enum EntryStatus {
    Present(RepositorySeries),
    Missing,
    Unreadable(String),
}
