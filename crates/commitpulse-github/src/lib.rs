pub mod client;
pub mod commits;
pub mod error;

// Re-exports
pub use client::{GitHubClient, DEFAULT_API_URL, DEFAULT_PAGE_SIZE};
pub use commits::parse_commit_page;
pub use error::{Error, Result};
