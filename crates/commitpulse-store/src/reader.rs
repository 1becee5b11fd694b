use crate::{
    models::{CsvRow, EntryStatus, ResultEntry, SERIES_FILE_NAME},
    Error, Result,
};
use commitpulse_core::RepositorySeries;
use std::path::Path;

/// Read a stored `commit_count.csv` back into a series.
pub async fn read_series(repository: &str, path: &Path) -> Result<RepositorySeries> {
    let bytes = tokio::fs::read(path).await?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let mut days = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = row.map_err(|e| Error::InvalidRow {
            path: path.to_path_buf(),
            line,
            reason: e.to_string(),
        })?;
        let daily = row.to_daily_count().ok_or_else(|| Error::InvalidRow {
            path: path.to_path_buf(),
            line,
            reason: format!("date {:?} is not DD.MM.YYYY", row.date),
        })?;
        days.push(daily);
    }

    Ok(RepositorySeries::from_counts(repository.to_string(), days))
}

/// List every repository directory under `root`, sorted by name.
pub async fn scan_results(root: &Path) -> Result<Vec<ResultEntry>> {
    if !tokio::fs::try_exists(root).await? {
        return Err(Error::ResultDirMissing(root.to_path_buf()));
    }

    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(root).await?;

    while let Some(entry) = dir.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }

        let repository = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path().join(SERIES_FILE_NAME);

        let status = if !tokio::fs::try_exists(&path).await? {
            EntryStatus::Missing
        } else {
            match read_series(&repository, &path).await {
                Ok(series) => EntryStatus::Present(series),
                Err(e) => {
                    tracing::warn!("Could not read {}: {}", path.display(), e);
                    EntryStatus::Unreadable(e.to_string())
                }
            }
        };

        entries.push(ResultEntry {
            repository,
            path,
            status,
        });
    }

    entries.sort_by(|a, b| a.repository.cmp(&b.repository));

    Ok(entries)
}
