//! Shared vocabulary of the bill embedding job.
//!
//! - [`types`]  - rows as read from the source, normalized records, vectors
//! - [`traits`] - collaborators the pipeline calls into (row source,
//!   embedding model, object store, relational sink)
//! - [`errors`] - error taxonomy shared by collaborators and the pipeline

pub mod errors;
pub mod traits;
pub mod types;

pub use errors::{BoxError, EmbeddingServiceError, QueryError, SinkWriteError};
pub use traits::{EmbeddingModel, ObjectStoreUploader, RelationalSink, RowSource};
pub use types::{BillRecord, EmbeddedBill, EmbeddingVector, RawBillRow};
