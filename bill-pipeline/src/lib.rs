//! Bill embedding pipeline.
//!
//! `rows → normalize → embed (rate limited) → sink`, run once per request.
//!
//! - [`normalizer`] - raw rows to [`BillRecord`](bill_core::BillRecord)s
//! - [`generator`]  - one embedding call per record, lenient or strict
//! - [`rate_limit`] - per-run fixed-window pause
//! - [`sink`]       - CSV export to object storage, or transactional insert
//! - [`run`]        - the whole thing end to end

pub mod config;
pub mod errors;
pub mod generator;
pub mod normalizer;
pub mod rate_limit;
pub mod run;
pub mod sink;

pub use config::{PipelineConfig, SinkMode};
pub use errors::PipelineError;
pub use generator::{EmbeddingBatch, FailureMode, GeneratorOptions, generate_embeddings};
pub use normalizer::normalize_rows;
pub use rate_limit::{RateLimitPolicy, RateLimitWindow};
pub use run::{PipelineReport, run_pipeline};
pub use sink::{BillSink, SinkOutcome};
