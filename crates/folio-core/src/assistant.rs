//! Entry point tying retrieval, generation, repository listing, and sync
//! to one account's knowledge base.

use std::sync::Arc;

use folio_github::{CodeHost, GitHubError, RepoSummary};
use folio_llm::{LlmProvider, Message};
use folio_memory::VectorStore;
use folio_memory::document::{IngestConfig, Normalizer};
use tokio::sync::OnceCell;

use crate::config::{Config, collection_name};
use crate::pipeline::{ConversationState, GenerateNode, Graph, PipelineError, RetrieveNode};
use crate::profile::UserProfile;
use crate::skills::SkillCatalog;
use crate::sync::{SyncError, SyncGuard, SyncOutcome, SyncRequest, SyncService};

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("message is required")]
    EmptyMessage,

    #[error("code host error: {0}")]
    Host(#[from] GitHubError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl AssistantError {
    /// Records a failed sync stored before aborting.
    #[must_use]
    pub fn committed(&self) -> usize {
        match self {
            Self::Sync(e) => e.committed(),
            Self::EmptyMessage | Self::Host(_) | Self::Pipeline(_) => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub profile: UserProfile,
    pub top_k: u64,
    pub collection_prefix: String,
    /// Fixed account; `None` resolves the credential owner on first use.
    pub account: Option<String>,
    pub ingest: IngestConfig,
    pub readme_max_chars: usize,
}

impl AssistantSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            profile: config.profile.clone(),
            top_k: config.memory.top_k,
            collection_prefix: config.memory.collection_prefix.clone(),
            account: config.github.user.clone(),
            ingest: config.ingest_config(),
            readme_max_chars: config.memory.readme_max_chars,
        }
    }
}

pub struct Assistant<P> {
    provider: Arc<P>,
    store: Arc<dyn VectorStore>,
    host: Arc<dyn CodeHost>,
    catalog: Arc<SkillCatalog>,
    settings: AssistantSettings,
    sync: SyncService<P>,
    account: OnceCell<String>,
}

impl<P: LlmProvider + 'static> Assistant<P> {
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        store: Arc<dyn VectorStore>,
        host: Arc<dyn CodeHost>,
        catalog: SkillCatalog,
        settings: AssistantSettings,
    ) -> Self {
        let sync = SyncService::new(
            Arc::clone(&provider),
            Arc::clone(&store),
            Arc::clone(&host),
            Normalizer::new(settings.readme_max_chars),
            settings.ingest.clone(),
        );
        let account = OnceCell::new_with(settings.account.clone());
        Self {
            provider,
            store,
            host,
            catalog: Arc::new(catalog),
            settings,
            sync,
            account,
        }
    }

    /// Account whose repositories back the knowledge base.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential owner cannot be resolved.
    pub async fn account(&self) -> Result<&str, GitHubError> {
        self.account
            .get_or_try_init(|| self.host.authenticated_user())
            .await
            .map(String::as_str)
    }

    /// # Errors
    ///
    /// Returns an error if the account cannot be resolved.
    pub async fn collection(&self) -> Result<String, GitHubError> {
        let account = self.account().await?;
        Ok(collection_name(&self.settings.collection_prefix, account))
    }

    #[must_use]
    pub fn sync_guard(&self) -> &SyncGuard {
        self.sync.guard()
    }

    /// Answer a single message.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::EmptyMessage`] for blank input, or the
    /// failure that ended the pipeline.
    pub async fn chat(&self, message: &str) -> Result<String, AssistantError> {
        if message.trim().is_empty() {
            return Err(AssistantError::EmptyMessage);
        }
        self.converse(vec![Message::user(message)]).await
    }

    /// Answer the last user turn of `history`, passing the whole history to
    /// the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the history has no user message, or if retrieval
    /// or generation fails.
    pub async fn converse(&self, history: Vec<Message>) -> Result<String, AssistantError> {
        let collection = self.collection().await?;
        let graph = Graph::new(
            RetrieveNode::new(
                Arc::clone(&self.provider),
                Arc::clone(&self.store),
                collection,
                self.settings.top_k,
                Arc::clone(&self.catalog),
            ),
            GenerateNode::new(Arc::clone(&self.provider), Arc::clone(&self.catalog)),
        );

        let state = ConversationState::new(self.settings.profile.clone(), history);
        let state = graph.run(state).await?;
        state
            .last_reply()
            .map(str::to_owned)
            .ok_or(AssistantError::Pipeline(PipelineError::NoReply))
    }

    /// # Errors
    ///
    /// Returns an error if the code host request fails.
    pub async fn list_repos(&self) -> Result<Vec<RepoSummary>, AssistantError> {
        let account = self.account().await?;
        Ok(self.host.list_repos(account).await?)
    }

    /// Rebuild the knowledge base. See [`SyncService::run`].
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be resolved or the sync fails.
    pub async fn sync(&self, request: SyncRequest) -> Result<SyncOutcome, AssistantError> {
        let account = self.account().await?;
        let collection = collection_name(&self.settings.collection_prefix, account);
        Ok(self.sync.run(account, &collection, request).await?)
    }
}
