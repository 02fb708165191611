//! Repository listing and file retrieval against the GitHub REST API.

pub mod client;
pub mod error;
pub mod host;
pub mod types;

pub use client::GitHubClient;
pub use error::GitHubError;
pub use host::CodeHost;
pub use types::RepoSummary;
