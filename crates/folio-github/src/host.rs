use std::future::Future;
use std::pin::Pin;

use crate::error::GitHubError;
use crate::types::RepoSummary;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of repository metadata and file contents.
pub trait CodeHost: Send + Sync {
    /// Login of the account the credentials belong to.
    fn authenticated_user(&self) -> BoxFuture<'_, Result<String, GitHubError>>;

    /// Repositories owned by `user`, most recently pushed first.
    fn list_repos(&self, user: &str) -> BoxFuture<'_, Result<Vec<RepoSummary>, GitHubError>>;

    /// UTF-8 contents of `path`, or `None` when the file does not exist.
    fn get_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> BoxFuture<'_, Result<Option<String>, GitHubError>>;
}
