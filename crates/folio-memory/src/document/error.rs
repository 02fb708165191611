use crate::vector_store::VectorStoreError;

/// Ingestion failure. `committed` counts records already written when the
/// run stopped; they stay in the index.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("embedding failed after {committed} records were stored: {source}")]
    Embedding {
        committed: usize,
        #[source]
        source: folio_llm::LlmError,
    },

    #[error("storage failed after {committed} records were stored: {source}")]
    Storage {
        committed: usize,
        #[source]
        source: VectorStoreError,
    },
}

impl DocumentError {
    #[must_use]
    pub fn committed(&self) -> usize {
        match self {
            Self::Embedding { committed, .. } | Self::Storage { committed, .. } => *committed,
        }
    }
}
