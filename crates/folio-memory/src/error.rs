use crate::document::DocumentError;
use crate::vector_store::VectorStoreError;

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("ingestion error: {0}")]
    Ingest(#[from] DocumentError),

    #[error("LLM error: {0}")]
    Llm(#[from] folio_llm::LlmError),
}

impl MemoryError {
    /// Records stored before an ingestion failure; zero for other failures.
    #[must_use]
    pub fn committed(&self) -> usize {
        match self {
            Self::Ingest(e) => e.committed(),
            _ => 0,
        }
    }
}
