use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "commitpulse")]
#[command(about = "Daily commit histograms for every repository of a GitHub organization", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory receiving one folder per repository (overrides RESULT_DIR)
    #[arg(long, global = true)]
    pub result_dir: Option<PathBuf>,

    /// GitHub token (overrides GITHUB_TOKEN)
    #[arg(long, global = true)]
    pub github_token: Option<String>,

    /// Settings file; `commitpulse.toml` is read when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Walk every repository's history and write its daily commit counts
    Collect {
        /// Organization to list repositories from
        #[arg(long)]
        org: Option<String>,

        /// Maximum number of repositories walked at the same time
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Commits requested per page (1-100)
        #[arg(long)]
        page_size: Option<u8>,

        /// Give up on a repository after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Summarize previously collected results
    Summary,
}

impl Commands {
    pub fn default_collect() -> Self {
        Commands::Collect {
            org: None,
            max_concurrency: None,
            page_size: None,
            timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["commitpulse"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "commitpulse",
            "collect",
            "--org",
            "rust-lang",
            "--result-dir",
            "/tmp/results",
            "--max-concurrency",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.result_dir, Some(PathBuf::from("/tmp/results")));
        assert_eq!(
            cli.command,
            Some(Commands::Collect {
                org: Some("rust-lang".to_string()),
                max_concurrency: Some(4),
                page_size: None,
                timeout_secs: None,
            })
        );
    }
}
