//! Knowledge-base ingestion and vector index management backed by Qdrant.

pub mod document;
pub mod error;
pub mod in_memory_store;
pub mod qdrant_ops;
pub mod vector_store;

pub use error::MemoryError;
pub use in_memory_store::InMemoryVectorStore;
pub use qdrant_ops::QdrantOps;
pub use vector_store::{
    DistanceMetric, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError,
};
