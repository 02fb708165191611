//! Full resync of one account's knowledge base from the code host.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use folio_github::{CodeHost, GitHubError, RepoSummary};
use folio_llm::LlmProvider;
use folio_llm::provider::EmbedBatchFuture;
use folio_memory::document::{
    EmbedBatchFn, IngestConfig, IngestReport, IngestionPipeline, Normalizer, RepoDetails,
    RepoSnapshot,
};
use folio_memory::{MemoryError, VectorStore};
use serde::{Deserialize, Serialize};

const MANIFEST_PATH: &str = "package.json";
const README_PATH: &str = "README.md";

/// A repository chosen for ingestion and the user's tags for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepoSelection {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub bio: Option<String>,
    /// `None` ingests every owned repository.
    #[serde(default)]
    pub repos: Option<Vec<RepoSelection>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Documents produced by normalization.
    pub documents: usize,
    pub skipped_repos: usize,
    pub report: IngestReport,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("a sync for {account} is already in progress")]
    InProgress { account: String },

    #[error("code host error: {0}")]
    Host(#[from] GitHubError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("provider {provider} cannot produce embeddings")]
    EmbeddingsUnsupported { provider: String },

    /// Every embedding had the wrong dimensionality for the collection.
    #[error("none of {documents} documents were stored ({dropped} had mismatched dimensions)")]
    NothingStored { documents: usize, dropped: usize },
}

impl SyncError {
    /// Records stored before the failure; they remain in the index.
    #[must_use]
    pub fn committed(&self) -> usize {
        match self {
            Self::Memory(e) => e.committed(),
            Self::InProgress { .. }
            | Self::Host(_)
            | Self::EmbeddingsUnsupported { .. }
            | Self::NothingStored { .. } => 0,
        }
    }
}

/// Admits at most one sync per account at a time.
#[derive(Debug, Clone, Default)]
pub struct SyncGuard {
    active: Arc<Mutex<HashSet<String>>>,
}

/// Held for the duration of one sync; releases the account on drop.
#[derive(Debug)]
pub struct SyncPermit {
    account: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl SyncGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when a sync for `account` is already running.
    #[must_use]
    pub fn try_acquire(&self, account: &str) -> Option<SyncPermit> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(account.to_owned()) {
            return None;
        }
        Some(SyncPermit {
            account: account.to_owned(),
            active: Arc::clone(&self.active),
        })
    }

    #[must_use]
    pub fn is_active(&self, account: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(account)
    }
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.account);
    }
}

pub struct SyncService<P> {
    provider: Arc<P>,
    store: Arc<dyn VectorStore>,
    host: Arc<dyn CodeHost>,
    normalizer: Normalizer,
    ingest: IngestConfig,
    guard: SyncGuard,
}

impl<P: LlmProvider + 'static> SyncService<P> {
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        store: Arc<dyn VectorStore>,
        host: Arc<dyn CodeHost>,
        normalizer: Normalizer,
        ingest: IngestConfig,
    ) -> Self {
        Self {
            provider,
            store,
            host,
            normalizer,
            ingest,
            guard: SyncGuard::new(),
        }
    }

    #[must_use]
    pub fn guard(&self) -> &SyncGuard {
        &self.guard
    }

    /// Fetch the selected repositories of `account`, normalize them with the
    /// bio, and replace the contents of `collection`.
    ///
    /// A repository whose files cannot be fetched is skipped with a warning.
    /// Rate limiting, rejected credentials, and transport failures abort the
    /// run before the collection is touched. A failure while ingesting leaves
    /// the collection partially filled; the error reports how many records
    /// were stored.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InProgress`] if `account` is already syncing,
    /// [`SyncError::NothingStored`] if no embedding matched the collection's
    /// dimensionality, or the code host, embedding, or vector store failure
    /// that aborted the run.
    pub async fn run(
        &self,
        account: &str,
        collection: &str,
        request: SyncRequest,
    ) -> Result<SyncOutcome, SyncError> {
        let _permit = self
            .guard
            .try_acquire(account)
            .ok_or_else(|| SyncError::InProgress {
                account: account.to_owned(),
            })?;

        if !self.provider.supports_embeddings() {
            return Err(SyncError::EmbeddingsUnsupported {
                provider: self.provider.name().to_owned(),
            });
        }

        tracing::info!(account, collection, "sync started");
        let repos = self.host.list_repos(account).await?;
        let selected = select_repos(repos, request.repos.as_deref());

        let mut snapshots = Vec::with_capacity(selected.len());
        let mut skipped_repos = 0;
        for (summary, tags) in selected {
            match self.snapshot(account, summary, tags).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err((name, e)) if e.is_resource_scoped() => {
                    tracing::warn!(repo = %name, "skipping repository: {e}");
                    skipped_repos += 1;
                }
                Err((name, e)) => {
                    tracing::error!(repo = %name, "aborting sync, index left unchanged: {e}");
                    return Err(SyncError::Host(e));
                }
            }
        }

        let documents = self.normalizer.normalize(request.bio.as_deref(), &snapshots);
        let count = documents.len();
        tracing::info!(
            account,
            repos = snapshots.len(),
            skipped_repos,
            documents = count,
            "normalized sources"
        );

        let pipeline = IngestionPipeline::new(
            Arc::clone(&self.store),
            collection,
            self.ingest.clone(),
            self.embed_fn(),
        );
        let report = pipeline.ingest(documents).await.map_err(MemoryError::from)?;
        if count > 0 && report.upserted == 0 {
            tracing::error!(
                collection,
                vector_size = self.ingest.vector_size,
                dropped = report.dropped,
                "no embedding matched the collection dimensionality"
            );
            return Err(SyncError::NothingStored {
                documents: count,
                dropped: report.dropped,
            });
        }

        Ok(SyncOutcome {
            documents: count,
            skipped_repos,
            report,
        })
    }

    async fn snapshot(
        &self,
        owner: &str,
        summary: RepoSummary,
        tags: Vec<String>,
    ) -> Result<RepoSnapshot, (String, GitHubError)> {
        let manifest = self
            .host
            .get_file(owner, &summary.name, MANIFEST_PATH)
            .await
            .map_err(|e| (summary.name.clone(), e))?;
        let readme = self
            .host
            .get_file(owner, &summary.name, README_PATH)
            .await
            .map_err(|e| (summary.name.clone(), e))?;

        Ok(RepoSnapshot {
            name: summary.name,
            details: Some(RepoDetails {
                description: summary.description,
                language: summary.language,
                topics: summary.topics,
                tags,
            }),
            manifest,
            readme,
        })
    }

    fn embed_fn(&self) -> EmbedBatchFn {
        let provider = Arc::clone(&self.provider);
        Box::new(move |texts: Vec<String>| -> EmbedBatchFuture {
            let provider = Arc::clone(&provider);
            Box::pin(async move { provider.embed_batch(&texts).await })
        })
    }
}

/// Pair each selected repository with its tags, in request order. Without a
/// selection every repository is kept untagged. Unknown names are dropped.
fn select_repos(
    repos: Vec<RepoSummary>,
    selection: Option<&[RepoSelection]>,
) -> Vec<(RepoSummary, Vec<String>)> {
    let Some(selection) = selection else {
        return repos.into_iter().map(|r| (r, Vec::new())).collect();
    };

    let mut selected = Vec::with_capacity(selection.len());
    let mut seen = HashSet::new();
    for choice in selection {
        if !seen.insert(choice.name.to_lowercase()) {
            continue;
        }
        match repos.iter().find(|r| r.name.eq_ignore_ascii_case(&choice.name)) {
            Some(repo) => selected.push((repo.clone(), choice.tags.clone())),
            None => tracing::warn!(repo = %choice.name, "selected repository not found, ignoring"),
        }
    }
    selected
}
