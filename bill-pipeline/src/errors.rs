//! Unified error type for one pipeline run.

use bill_core::{EmbeddingServiceError, QueryError, SinkWriteError};
use thiserror::Error;

/// Result alias used across the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Everything that can abort a pipeline run.
///
/// Each variant maps to a distinct failure class of the request; the HTTP
/// layer picks its status code from the variant.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading rows from the source failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A source row could not be normalized. Nothing is embedded or written.
    #[error("malformed record at row {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// An embedding call failed in strict mode.
    #[error("embedding failed for record {index}: {source}")]
    EmbeddingService {
        index: usize,
        #[source]
        source: EmbeddingServiceError,
    },

    /// The export upload or the database insert failed.
    #[error(transparent)]
    SinkWrite(#[from] SinkWriteError),
}
