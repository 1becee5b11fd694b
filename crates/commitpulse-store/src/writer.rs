use crate::{
    models::{CsvRow, CSV_HEADER, SERIES_FILE_NAME},
    Error, Result,
};
use async_trait::async_trait;
use commitpulse_core::{RepositorySeries, SeriesSink};
use std::path::PathBuf;

/// Writes each repository's series to `<root>/<repository>/commit_count.csv`.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    root: PathBuf,
}

impl ResultWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn series_path(&self, repository: &str) -> Result<PathBuf> {
        validate_name(repository)?;
        Ok(self.root.join(repository).join(SERIES_FILE_NAME))
    }

    /// Replace the stored series for `series.repository`.
    ///
    /// Content goes to a sibling temp file first and is renamed into place.
    pub async fn write(&self, series: &RepositorySeries) -> Result<PathBuf> {
        let path = self.series_path(&series.repository)?;
        let dir = self.root.join(&series.repository);

        tokio::fs::create_dir_all(&dir).await?;

        let bytes = render_csv(series)?;
        let tmp_path = dir.join(format!("{}.tmp", SERIES_FILE_NAME));

        tokio::fs::write(&tmp_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());

        Ok(path)
    }
}

/// Render a series as CSV with a `date,commit_count` header.
pub fn render_csv(series: &RepositorySeries) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for daily in series.days() {
        writer.serialize(CsvRow::from(daily))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

fn validate_name(repository: &str) -> Result<()> {
    let invalid = repository.is_empty()
        || repository == "."
        || repository == ".."
        || repository.contains(['/', '\\', '\0']);

    if invalid {
        return Err(Error::InvalidRepositoryName(repository.to_string()));
    }

    Ok(())
}

#[async_trait]
impl SeriesSink for ResultWriter {
    async fn write_series(&self, series: &RepositorySeries) -> commitpulse_core::Result<PathBuf> {
        self.write(series)
            .await
            .map_err(|e| commitpulse_core::Error::WriteFailed {
                repository: series.repository.clone(),
                reason: e.to_string(),
            })
    }
}
