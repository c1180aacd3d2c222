//! Collaborator seams. The pipeline holds these as trait objects so the HTTP
//! layer can wire Postgres, Vertex AI and Cloud Storage in production and
//! in-memory stubs in tests.

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::{EmbeddingServiceError, QueryError, SinkWriteError};
use crate::types::{EmbeddedBill, EmbeddingVector, RawBillRow};

/// Reads bill rows inserted strictly after a date threshold.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn query(&self, threshold: NaiveDate) -> Result<Vec<RawBillRow>, QueryError>;
}

/// Hosted embedding model: one text in, one vector out.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingServiceError>;
}

/// Uploads a local file to object storage under `key`.
#[async_trait]
pub trait ObjectStoreUploader: Send + Sync {
    /// Returns a human-readable confirmation naming the destination.
    async fn upload(&self, local_path: &Path, key: &str) -> Result<String, SinkWriteError>;
}

/// Writes embedded bills to the output table.
#[async_trait]
pub trait RelationalSink: Send + Sync {
    /// Inserts every row or none of them. Returns the number of rows written.
    async fn execute_batch(&self, rows: &[EmbeddedBill]) -> Result<u64, SinkWriteError>;
}
