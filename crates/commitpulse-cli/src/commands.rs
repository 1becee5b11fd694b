use anyhow::{Context, Result};
use std::sync::Arc;

use crate::cli::Commands;
use crate::settings::{Settings, SettingsError};
use commitpulse_core::{
    CommitSource, Orchestrator, OrchestratorConfig, RepositorySource, RunSummary,
};
use commitpulse_github::GitHubClient;
use commitpulse_store::{scan_results, EntryStatus, ResultWriter};

pub async fn execute(command: Commands, settings: Settings) -> Result<()> {
    match command {
        Commands::Collect { .. } => collect(&settings).await,
        Commands::Summary => summary(&settings).await,
    }
}

async fn collect(settings: &Settings) -> Result<()> {
    let config = match settings.for_collect() {
        Ok(config) => config,
        Err(e) => return Err(abort(e)),
    };

    print_present(settings);

    let client = Arc::new(
        GitHubClient::with_api_url(config.github_token.clone(), &config.github_api_url)?
            .with_page_size(config.page_size),
    );

    let repositories = client
        .list_repositories(&config.github_org)
        .await
        .with_context(|| format!("Could not list repositories of {}", config.github_org))?;

    if repositories.is_empty() {
        println!("No repositories found in {}", config.github_org);
        return Ok(());
    }

    println!(
        "\nCollecting daily commit counts for {} repositories of {}...",
        repositories.len(),
        config.github_org
    );

    let source: Arc<dyn CommitSource> = client;
    let orchestrator = Orchestrator::new(
        source,
        Arc::new(ResultWriter::new(&config.result_dir)),
        OrchestratorConfig {
            max_concurrent_walks: config.max_concurrency,
            walk_timeout: config.walk_timeout,
        },
    );

    let summary = orchestrator.run(repositories).await;
    print_run_summary(&summary);

    if !summary.is_success() {
        anyhow::bail!(
            "{} of {} repositories failed",
            summary.failed.len(),
            summary.total()
        );
    }

    Ok(())
}

async fn summary(settings: &Settings) -> Result<()> {
    let result_dir = match settings.result_dir() {
        Ok(dir) => dir,
        Err(e) => return Err(abort(e)),
    };

    let entries = match scan_results(&result_dir).await {
        Ok(entries) => entries,
        Err(commitpulse_store::Error::ResultDirMissing(_)) => {
            println!(
                "Result directory {} does not exist. Run `commitpulse collect` to generate it.",
                result_dir.display()
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if entries.is_empty() {
        println!("No repository results in {}", result_dir.display());
        return Ok(());
    }

    for entry in &entries {
        match &entry.status {
            EntryStatus::Present(series) => {
                let (Some(first), Some(last), Some(busiest)) =
                    (series.first_day(), series.last_day(), series.busiest_day())
                else {
                    println!("  {:<32} empty series", entry.repository);
                    continue;
                };

                println!(
                    "  {:<32} {} - {}  {:>6} days  {:>7} commits  busiest {} ({})",
                    entry.repository,
                    first.format(commitpulse_core::DAY_FORMAT),
                    last.format(commitpulse_core::DAY_FORMAT),
                    series.len(),
                    series.total_commits(),
                    busiest.formatted_day(),
                    busiest.count
                );
            }
            EntryStatus::Missing => {
                println!(
                    "  {:<32} commit count CSV file not found ({})",
                    entry.repository,
                    entry.path.display()
                );
            }
            EntryStatus::Unreadable(reason) => {
                println!("  {:<32} unreadable: {}", entry.repository, reason);
            }
        }
    }

    Ok(())
}

/// Report missing settings the way the run is aborted before any work starts.
fn abort(err: SettingsError) -> anyhow::Error {
    if let SettingsError::Missing(names) = &err {
        println!(
            "Some required settings were not set:\n{}\n\nThe run is aborted.",
            names.join("\n")
        );
    }
    err.into()
}

fn print_present(settings: &Settings) {
    println!("The following settings were set:");
    for (name, value) in settings.present() {
        println!("  {}: {}", name, value);
    }
}

fn print_run_summary(summary: &RunSummary) {
    let mut succeeded: Vec<_> = summary.succeeded.iter().collect();
    succeeded.sort_by(|a, b| a.repository.cmp(&b.repository));

    let mut failed: Vec<_> = summary.failed.iter().collect();
    failed.sort_by(|a, b| a.repository.cmp(&b.repository));

    println!();
    println!("✓ {} repositories written", succeeded.len());
    for written in succeeded {
        println!(
            "  {:<32} {:>6} days  {:>7} commits  {}",
            written.repository,
            written.days,
            written.total_commits,
            written.path.display()
        );
    }

    if !failed.is_empty() {
        println!("✗ {} repositories failed", failed.len());
        for failure in failed {
            println!("  {:<32} {}", failure.repository, failure.error);
        }
    }
}
