use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date format used in persisted series (`DD.MM.YYYY`).
pub const DAY_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: u64,
}

impl DailyCount {
    pub fn new(day: NaiveDate, count: u64) -> Self {
        Self { day, count }
    }

    pub fn formatted_day(&self) -> String {
        self.day.format(DAY_FORMAT).to_string()
    }
}

/// Finalized per-day commit history of one repository, oldest day first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySeries {
    pub repository: String,
    days: Vec<DailyCount>,
}

impl RepositorySeries {
    /// Build a series from arbitrary records. Records are sorted by day and
    /// repeated days are merged by summing their counts.
    pub fn from_counts(repository: String, counts: impl IntoIterator<Item = DailyCount>) -> Self {
        let mut accumulator = DayAccumulator::new();
        for daily in counts {
            accumulator.add(daily.day, daily.count);
        }
        accumulator.finalize(repository)
    }

    pub fn days(&self) -> &[DailyCount] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn total_commits(&self) -> u64 {
        self.days.iter().map(|d| d.count).sum()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.day)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.day)
    }

    /// Day with the most commits. Ties go to the earliest day.
    pub fn busiest_day(&self) -> Option<DailyCount> {
        self.days
            .iter()
            .copied()
            .fold(None, |best: Option<DailyCount>, d| match best {
                Some(b) if b.count >= d.count => Some(b),
                _ => Some(d),
            })
    }
}

/// Per-day commit counts collected across all pages of one walk.
///
/// Keyed by day so that windows sharing a boundary day merge into a single
/// entry; materialized into an ordered series only once the walk ends.
#[derive(Debug, Default)]
pub struct DayAccumulator {
    counts: BTreeMap<NaiveDate, u64>,
}

impl DayAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, day: NaiveDate, count: u64) {
        *self.counts.entry(day).or_insert(0) += count;
    }

    /// Add every day in `[from, to]`, taking counts from `bucketed` and
    /// recording 0 for days it doesn't mention.
    pub fn add_window(&mut self, from: NaiveDate, to: NaiveDate, bucketed: &BTreeMap<NaiveDate, u64>) {
        for day in from.iter_days().take_while(|day| *day <= to) {
            self.add(day, bucketed.get(&day).copied().unwrap_or(0));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn finalize(self, repository: String) -> RepositorySeries {
        let days = self
            .counts
            .into_iter()
            .map(|(day, count)| DailyCount::new(day, count))
            .collect();

        RepositorySeries { repository, days }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_fills_gaps_with_zero() {
        let mut bucketed = BTreeMap::new();
        bucketed.insert(day(2024, 1, 5), 3);
        bucketed.insert(day(2024, 1, 7), 1);

        let mut acc = DayAccumulator::new();
        acc.add_window(day(2024, 1, 5), day(2024, 1, 7), &bucketed);

        let series = acc.finalize("repo".to_string());
        assert_eq!(
            series.days(),
            &[
                DailyCount::new(day(2024, 1, 5), 3),
                DailyCount::new(day(2024, 1, 6), 0),
                DailyCount::new(day(2024, 1, 7), 1),
            ]
        );
    }

    #[test]
    fn test_shared_boundary_day_is_merged() {
        let mut first = BTreeMap::new();
        first.insert(day(2024, 1, 3), 2);
        first.insert(day(2024, 1, 4), 1);

        let mut second = BTreeMap::new();
        second.insert(day(2024, 1, 1), 1);
        second.insert(day(2024, 1, 3), 4);

        let mut acc = DayAccumulator::new();
        acc.add_window(day(2024, 1, 3), day(2024, 1, 4), &first);
        acc.add_window(day(2024, 1, 1), day(2024, 1, 3), &second);

        let series = acc.finalize("repo".to_string());
        let days: Vec<(u32, u64)> = series
            .days()
            .iter()
            .map(|d| (chrono::Datelike::day(&d.day), d.count))
            .collect();

        assert_eq!(days, vec![(1, 1), (2, 0), (3, 6), (4, 1)]);
    }

    #[test]
    fn test_from_counts_sorts_and_merges() {
        let series = RepositorySeries::from_counts(
            "repo".to_string(),
            vec![
                DailyCount::new(day(2024, 2, 2), 1),
                DailyCount::new(day(2024, 2, 1), 2),
                DailyCount::new(day(2024, 2, 2), 3),
            ],
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series.first_day(), Some(day(2024, 2, 1)));
        assert_eq!(series.total_commits(), 6);
        assert_eq!(series.busiest_day(), Some(DailyCount::new(day(2024, 2, 2), 4)));
    }

    #[test]
    fn test_formatted_day() {
        let daily = DailyCount::new(day(2024, 1, 5), 3);
        assert_eq!(daily.formatted_day(), "05.01.2024");
    }
}
