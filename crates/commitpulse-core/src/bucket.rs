use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Commit counts per UTC calendar day for one batch of timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayBuckets {
    pub counts: BTreeMap<NaiveDate, u64>,
    /// Earliest timestamp in the batch, `None` when the batch was empty.
    pub oldest: Option<DateTime<Utc>>,
}

impl DayBuckets {
    /// Bucket a batch of commit timestamps. Input order doesn't matter.
    pub fn from_timestamps(timestamps: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        let mut buckets = Self::default();

        for ts in timestamps {
            *buckets.counts.entry(ts.date_naive()).or_insert(0) += 1;
            buckets.oldest = Some(match buckets.oldest {
                Some(oldest) if oldest <= ts => oldest,
                _ => ts,
            });
        }

        buckets
    }

    pub fn is_empty(&self) -> bool {
        self.oldest.is_none()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}
