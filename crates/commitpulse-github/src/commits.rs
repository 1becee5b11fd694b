use chrono::{DateTime, Utc};
use commitpulse_core::{CommitPage, CommitRecord};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

/// Interpret the body of a `GET /repos/{owner}/{repo}/commits` response.
///
/// A body that is not an array, or whose first element carries no committer
/// date, is reported as malformed rather than as an error. Later elements
/// without a date are skipped.
pub fn parse_commit_page(body: &Value) -> CommitPage {
    let Some(items) = body.as_array() else {
        return CommitPage::Malformed(describe_non_array(body));
    };

    let mut commits = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        match dated_commit(item) {
            Ok(record) => commits.push(record),
            Err(reason) if index == 0 => {
                return CommitPage::Malformed(format!("commit #0 {}", reason));
            }
            Err(reason) => {
                tracing::debug!("Skipping commit #{}: {}", index, reason);
            }
        }
    }

    CommitPage::Commits(commits)
}

fn dated_commit(item: &Value) -> std::result::Result<CommitRecord, String> {
    match CommitItem::deserialize(item) {
        Ok(CommitItem {
            sha,
            commit:
                CommitDetail {
                    committer: Some(committer),
                },
        }) => Ok(CommitRecord::new(sha, committer.date)),
        Ok(CommitItem { sha, .. }) => Err(format!("({}) has no committer", sha)),
        Err(e) => Err(format!("is not a commit: {}", e)),
    }
}

fn describe_non_array(body: &Value) -> String {
    match body.get("message").and_then(Value::as_str) {
        Some(message) => format!("expected a commit list, got message: {}", message),
        None => "expected a commit list".to_string(),
    }
}
