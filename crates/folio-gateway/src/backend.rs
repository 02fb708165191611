use std::future::Future;
use std::pin::Pin;

use folio_core::assistant::{Assistant, AssistantError};
use folio_core::sync::{SyncOutcome, SyncRequest};
use folio_github::RepoSummary;
use folio_llm::LlmProvider;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Operations the gateway serves.
pub trait Backend: Send + Sync + 'static {
    fn chat(&self, message: String) -> BoxFuture<'_, Result<String, AssistantError>>;

    fn list_repos(&self) -> BoxFuture<'_, Result<Vec<RepoSummary>, AssistantError>>;

    fn sync(&self, request: SyncRequest) -> BoxFuture<'_, Result<SyncOutcome, AssistantError>>;
}

impl<P: LlmProvider + 'static> Backend for Assistant<P> {
    fn chat(&self, message: String) -> BoxFuture<'_, Result<String, AssistantError>> {
        Box::pin(async move { Assistant::chat(self, &message).await })
    }

    fn list_repos(&self) -> BoxFuture<'_, Result<Vec<RepoSummary>, AssistantError>> {
        Box::pin(Assistant::list_repos(self))
    }

    fn sync(&self, request: SyncRequest) -> BoxFuture<'_, Result<SyncOutcome, AssistantError>> {
        Box::pin(Assistant::sync(self, request))
    }
}
