pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod types;

pub use error::DocumentError;
pub use normalize::{Normalizer, RepoDetails, RepoSnapshot, extract_skills};
pub use pipeline::{EmbedBatchFn, IngestConfig, IngestReport, IngestionPipeline};
pub use types::{Document, DocumentMetadata};

/// Default README character budget per repository.
pub const DEFAULT_README_MAX_CHARS: usize = 3000;
