use serde::{Deserialize, Serialize};

/// A repository whose commit history is walked.
///
/// `commits_url` is the commit-listing endpoint; the walk appends its own
/// `until` cursor to it on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub commits_url: String,
}

impl Repository {
    pub fn new(name: String, full_name: String, commits_url: String) -> Self {
        Self {
            name,
            full_name,
            commits_url,
        }
    }

    /// Build a repository pointing at the standard REST commits endpoint.
    pub fn from_full_name(api_url: &str, full_name: &str) -> Self {
        let name = full_name
            .rsplit('/')
            .next()
            .unwrap_or(full_name)
            .to_string();

        Self {
            name,
            full_name: full_name.to_string(),
            commits_url: format!(
                "{}/repos/{}/commits",
                api_url.trim_end_matches('/'),
                full_name
            ),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_name)
    }
}
