use crate::{commits::parse_commit_page, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use commitpulse_core::{CommitPage, CommitSource, Repository, RepositorySource};
use octocrab::Octocrab;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, Response, StatusCode};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PAGE_SIZE: u8 = 100;

const USER_AGENT_VALUE: &str = "commitpulse";
const GITHUB_JSON: &str = "application/vnd.github+json";

/// Shared GitHub access for a whole run.
///
/// Organization listing goes through octocrab; commit pages are fetched with
/// the raw HTTP client so that error bodies and status codes stay visible.
#[derive(Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
    http: Client,
    token: String,
    api_url: String,
    page_size: u8,
}

impl GitHubClient {
    pub fn new(token: String) -> Result<Self> {
        Self::with_api_url(token, DEFAULT_API_URL)
    }

    pub fn with_api_url(token: String, api_url: &str) -> Result<Self> {
        let api_url = api_url.trim_end_matches('/').to_string();

        let octocrab = Octocrab::builder()
            .personal_token(token.clone())
            .base_uri(api_url.as_str())
            .map_err(|e| Error::InvalidApiUrl(format!("{}: {}", api_url, e)))?
            .build()?;

        let http = Client::builder().user_agent(USER_AGENT_VALUE).build()?;

        Ok(Self {
            octocrab,
            http,
            token,
            api_url,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Commits per page, clamped to the API's 1..=100 range.
    pub fn with_page_size(mut self, page_size: u8) -> Self {
        self.page_size = page_size.clamp(1, 100);
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// List every repository of an organization, following pagination.
    pub async fn list_org_repositories(&self, organization: &str) -> Result<Vec<Repository>> {
        tracing::info!("Listing repositories of {}", organization);

        let first_page = self
            .octocrab
            .orgs(organization)
            .list_repos()
            .per_page(100)
            .send()
            .await?;

        let repos = self.octocrab.all_pages(first_page).await?;

        let repositories: Vec<Repository> = repos
            .into_iter()
            .map(|repo| {
                let full_name = repo
                    .full_name
                    .unwrap_or_else(|| format!("{}/{}", organization, repo.name));
                Repository::from_full_name(&self.api_url, &full_name)
            })
            .collect();

        tracing::info!("Found {} repositories in {}", repositories.len(), organization);

        Ok(repositories)
    }

    /// Fetch the newest page of commits made at or before `until`.
    pub async fn list_commits_until(
        &self,
        repo: &Repository,
        until: DateTime<Utc>,
    ) -> Result<CommitPage> {
        let until = until.to_rfc3339_opts(SecondsFormat::Secs, true);
        let per_page = self.page_size.to_string();

        let response = self
            .http
            .get(&repo.commits_url)
            .query(&[("until", until.as_str()), ("per_page", per_page.as_str())])
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_JSON)
            .send()
            .await?;

        let status = response.status();

        // GitHub answers 409 for repositories without any commits.
        if status == StatusCode::CONFLICT {
            tracing::debug!("{} has an empty git repository", repo);
            return Ok(CommitPage::empty());
        }

        if is_rate_limited(status, response.headers()) {
            return Err(Error::RateLimited {
                reset_at: rate_limit_reset(response.headers()),
            });
        }

        if !status.is_success() {
            return Err(api_error(response).await);
        }

        let text = response.text().await?;

        match serde_json::from_str(&text) {
            Ok(body) => Ok(parse_commit_page(&body)),
            Err(e) => Ok(CommitPage::Malformed(format!("invalid JSON body: {}", e))),
        }
    }
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v.trim() == "0"),
        _ => false,
    }
}

fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let epoch = headers
        .get("x-ratelimit-reset")?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()?;

    Utc.timestamp_opt(epoch, 0).single()
}

async fn api_error(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);

    Error::ApiError { status, message }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn list_repositories(&self, organization: &str) -> commitpulse_core::Result<Vec<Repository>> {
        self.list_org_repositories(organization)
            .await
            .map_err(|e| commitpulse_core::Error::ListingFailed(e.to_string()))
    }
}

#[async_trait]
impl CommitSource for GitHubClient {
    async fn fetch_commits(
        &self,
        repo: &Repository,
        until: DateTime<Utc>,
    ) -> commitpulse_core::Result<CommitPage> {
        Ok(self.list_commits_until(repo, until).await?)
    }
}
