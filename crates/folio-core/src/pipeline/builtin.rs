use std::sync::Arc;

use folio_llm::{LlmProvider, Message};
use folio_memory::{MemoryError, VectorStore};

use super::PipelineError;
use super::node::Node;
use super::state::{ConversationState, StateUpdate};
use crate::persona;
use crate::skills::SkillCatalog;

/// Separator between retrieved fragments in the assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Embeds the latest user message, fetches the top-K fragments, and records
/// the context together with the requested skills it does not cover.
pub struct RetrieveNode<P> {
    provider: Arc<P>,
    store: Arc<dyn VectorStore>,
    collection: String,
    top_k: u64,
    catalog: Arc<SkillCatalog>,
}

impl<P> RetrieveNode<P> {
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        top_k: u64,
        catalog: Arc<SkillCatalog>,
    ) -> Self {
        Self {
            provider,
            store,
            collection: collection.into(),
            top_k,
            catalog,
        }
    }
}

impl<P: LlmProvider> Node for RetrieveNode<P> {
    fn name(&self) -> &'static str {
        "retrieve"
    }

    async fn run(&self, state: &ConversationState) -> Result<StateUpdate, PipelineError> {
        let query = state
            .last_user_message()
            .ok_or(PipelineError::NoQuery)?
            .content
            .as_str();

        let exists = self
            .store
            .collection_exists(&self.collection)
            .await
            .map_err(MemoryError::from)?;

        let context = if exists {
            let embedding = self.provider.embed(query).await?;
            let hits = self
                .store
                .search(&self.collection, embedding, self.top_k)
                .await
                .map_err(MemoryError::from)?;
            tracing::debug!(
                collection = %self.collection,
                hits = hits.len(),
                "retrieved fragments"
            );
            hits.iter()
                .filter_map(|hit| hit.text())
                .collect::<Vec<_>>()
                .join(CONTEXT_SEPARATOR)
        } else {
            tracing::warn!(collection = %self.collection, "knowledge base not synced yet");
            String::new()
        };

        let missing = self
            .catalog
            .missing_skills(query, &context, state.user_profile.get());
        if !missing.is_empty() {
            tracing::debug!(?missing, "requested skills absent from knowledge base");
        }

        Ok(StateUpdate {
            context: Some(context),
            missing_skills: Some(missing),
            ..StateUpdate::default()
        })
    }
}

/// Composes the persona instruction and makes the single model call for
/// this turn.
pub struct GenerateNode<P> {
    provider: Arc<P>,
    catalog: Arc<SkillCatalog>,
}

impl<P> GenerateNode<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, catalog: Arc<SkillCatalog>) -> Self {
        Self { provider, catalog }
    }
}

impl<P: LlmProvider> Node for GenerateNode<P> {
    fn name(&self) -> &'static str {
        "generate"
    }

    async fn run(&self, state: &ConversationState) -> Result<StateUpdate, PipelineError> {
        let query = state
            .last_user_message()
            .ok_or(PipelineError::NoQuery)?
            .content
            .as_str();
        let profile = state.user_profile.get();
        let context = state.context.get();

        let pivots = self
            .catalog
            .pivots(state.missing_skills.get(), context, profile);
        let system = persona::system_prompt(profile, context, &pivots, query);

        let mut messages = Vec::with_capacity(state.messages.as_slice().len() + 1);
        messages.push(Message::system(system));
        messages.extend_from_slice(state.messages.as_slice());

        let reply = self.provider.chat(&messages).await?;
        Ok(StateUpdate {
            messages: vec![Message::assistant(reply)],
            ..StateUpdate::default()
        })
    }
}
