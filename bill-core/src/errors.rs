//! Error taxonomy shared by the collaborators and the pipeline.
//!
//! Collaborator crates keep their own detailed error enums and wrap them into
//! these types at the trait boundary, so the pipeline never depends on
//! `sqlx`, `reqwest`, or any other transport.

use thiserror::Error;

/// Boxed source error carried across crate boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reading rows from the source database failed.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The database rejected the query or the connection failed.
    #[error("database query failed: {0}")]
    Database(#[source] BoxError),
}

/// The embedding model could not produce a vector for one text.
#[derive(Debug, Error)]
pub enum EmbeddingServiceError {
    /// Neither headline nor story had any text to embed.
    #[error("record has no headline or story text to embed")]
    EmptyInput,

    /// The embedding backend failed (transport, HTTP status, decoding).
    #[error("embedding service error: {0}")]
    Backend(#[source] BoxError),
}

/// Writing the pipeline output failed.
#[derive(Debug, Error)]
pub enum SinkWriteError {
    /// Local scratch file could not be created or written.
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),

    /// Object store upload failed.
    #[error("upload failed: {0}")]
    Upload(#[source] BoxError),

    /// Database insert failed; the transaction was rolled back.
    #[error("database insert failed: {0}")]
    Database(#[source] BoxError),
}
