use crate::cli::{Cli, Commands};
use commitpulse_github::{DEFAULT_API_URL, DEFAULT_PAGE_SIZE};
use config::{Config, ConfigError, Environment, File};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ORG: &str = "exercism";
pub const DEFAULT_MAX_CONCURRENCY: i64 = 8;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Required settings not set: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Settings a command cannot run without, named by their environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Required {
    ResultDir,
    GithubToken,
}

impl Required {
    pub fn env_name(self) -> &'static str {
        match self {
            Required::ResultDir => "RESULT_DIR",
            Required::GithubToken => "GITHUB_TOKEN",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub result_dir: Option<PathBuf>,
    pub github_token: Option<String>,
    pub github_org: String,
    pub github_api_url: String,
    pub max_concurrency: usize,
    pub page_size: u8,
    pub walk_timeout: Option<Duration>,
}

/// Everything `collect` needs, with required values resolved.
#[derive(Debug, Clone)]
pub struct CollectSettings {
    pub result_dir: PathBuf,
    pub github_token: String,
    pub github_org: String,
    pub github_api_url: String,
    pub max_concurrency: usize,
    pub page_size: u8,
    pub walk_timeout: Option<Duration>,
}

impl Settings {
    /// Layer defaults, the settings file, the environment and CLI flags, in
    /// increasing order of precedence.
    pub fn load(cli: &Cli) -> Result<Self, SettingsError> {
        let file = match &cli.config {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name("commitpulse").required(false),
        };

        let (org, max_concurrency, page_size, timeout_secs) = match &cli.command {
            Some(Commands::Collect {
                org,
                max_concurrency,
                page_size,
                timeout_secs,
            }) => (org.clone(), *max_concurrency, *page_size, *timeout_secs),
            _ => (None, None, None, None),
        };

        let config = Config::builder()
            .set_default("github_org", DEFAULT_ORG)?
            .set_default("github_api_url", DEFAULT_API_URL)?
            .set_default("max_concurrency", DEFAULT_MAX_CONCURRENCY)?
            .set_default("page_size", i64::from(DEFAULT_PAGE_SIZE))?
            .add_source(file)
            .add_source(Environment::default())
            .set_override_option(
                "result_dir",
                cli.result_dir.as_ref().map(|p| p.display().to_string()),
            )?
            .set_override_option("github_token", cli.github_token.clone())?
            .set_override_option("github_org", org)?
            .set_override_option("max_concurrency", max_concurrency.map(|n| n as i64))?
            .set_override_option("page_size", page_size.map(i64::from))?
            .set_override_option("walk_timeout_secs", timeout_secs.map(|n| n as i64))?
            .build()?;

        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> Result<Self, SettingsError> {
        let max_concurrency = config.get_int("max_concurrency")?;
        if max_concurrency < 1 {
            return Err(SettingsError::Invalid {
                key: "max_concurrency",
                reason: format!("must be at least 1, got {}", max_concurrency),
            });
        }

        let page_size = config.get_int("page_size")?;
        if !(1..=100).contains(&page_size) {
            return Err(SettingsError::Invalid {
                key: "page_size",
                reason: format!("must be between 1 and 100, got {}", page_size),
            });
        }

        let walk_timeout = match optional_int(config, "walk_timeout_secs")? {
            Some(secs) if secs < 1 => {
                return Err(SettingsError::Invalid {
                    key: "walk_timeout_secs",
                    reason: format!("must be positive, got {}", secs),
                })
            }
            Some(secs) => Some(Duration::from_secs(secs as u64)),
            None => None,
        };

        Ok(Self {
            result_dir: optional_string(config, "result_dir")?.map(PathBuf::from),
            github_token: optional_string(config, "github_token")?,
            github_org: config.get_string("github_org")?,
            github_api_url: config.get_string("github_api_url")?,
            max_concurrency: max_concurrency as usize,
            page_size: page_size as u8,
            walk_timeout,
        })
    }

    /// Names of the `required` settings that are absent.
    pub fn missing(&self, required: &[Required]) -> Vec<&'static str> {
        required
            .iter()
            .filter(|r| match r {
                Required::ResultDir => self.result_dir.is_none(),
                Required::GithubToken => self.github_token.is_none(),
            })
            .map(|r| r.env_name())
            .collect()
    }

    pub fn result_dir(&self) -> Result<PathBuf, SettingsError> {
        self.result_dir
            .clone()
            .ok_or_else(|| SettingsError::Missing(self.missing(&[Required::ResultDir])))
    }

    pub fn for_collect(&self) -> Result<CollectSettings, SettingsError> {
        match (&self.result_dir, &self.github_token) {
            (Some(result_dir), Some(github_token)) => Ok(CollectSettings {
                result_dir: result_dir.clone(),
                github_token: github_token.clone(),
                github_org: self.github_org.clone(),
                github_api_url: self.github_api_url.clone(),
                max_concurrency: self.max_concurrency,
                page_size: self.page_size,
                walk_timeout: self.walk_timeout,
            }),
            _ => Err(SettingsError::Missing(
                self.missing(&[Required::ResultDir, Required::GithubToken]),
            )),
        }
    }

    /// Present settings for display, with the token masked.
    pub fn present(&self) -> Vec<(&'static str, String)> {
        let mut present = Vec::new();

        if let Some(dir) = &self.result_dir {
            present.push(("RESULT_DIR", dir.display().to_string()));
        }
        if let Some(token) = &self.github_token {
            present.push(("GITHUB_TOKEN", mask(token)));
        }
        present.push(("GITHUB_ORG", self.github_org.clone()));
        present.push(("GITHUB_API_URL", self.github_api_url.clone()));
        present.push(("MAX_CONCURRENCY", self.max_concurrency.to_string()));
        present.push(("PAGE_SIZE", self.page_size.to_string()));
        if let Some(timeout) = self.walk_timeout {
            present.push(("WALK_TIMEOUT_SECS", timeout.as_secs().to_string()));
        }

        present
    }
}

fn optional_string(config: &Config, key: &str) -> Result<Option<String>, SettingsError> {
    match config.get_string(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn optional_int(config: &Config, key: &str) -> Result<Option<i64>, SettingsError> {
    match config.get_int(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 8 {
        "********".to_string()
    } else {
        format!("{}********", visible)
    }
}
