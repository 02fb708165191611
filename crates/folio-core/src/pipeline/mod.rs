//! Two-stage retrieve-then-generate controller over a shared conversation state.

pub mod builtin;
pub mod graph;
pub mod node;
pub mod state;

pub use builtin::{GenerateNode, RetrieveNode};
pub use graph::{Graph, Stage};
pub use node::Node;
pub use state::{Append, ConversationState, Merge, Replace, StateUpdate};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Llm(#[from] folio_llm::LlmError),

    #[error(transparent)]
    Memory(#[from] folio_memory::MemoryError),

    #[error("conversation has no user message")]
    NoQuery,

    #[error("generation produced no reply")]
    NoReply,
}
