//! Embedding generator: one model call per record, in order.

use std::{fmt, str::FromStr};

use bill_core::{BillRecord, EmbeddingModel, EmbeddingServiceError, EmbeddingVector};
use tracing::{debug, info, warn};

use crate::errors::{PipelineError, Result};
use crate::rate_limit::{RateLimitPolicy, RateLimitWindow};

/// What to do when the model fails for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Store an empty vector for the record and keep going.
    #[default]
    Lenient,
    /// Abort the run on the first failure.
    Strict,
}

impl FromStr for FailureMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown failure mode `{other}` (expected lenient|strict)")),
        }
    }
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        })
    }
}

/// Knobs for [`generate_embeddings`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorOptions {
    pub failure_mode: FailureMode,
    pub rate_limit: RateLimitPolicy,
}

/// Output of one generator run. `vectors[i]` belongs to `records[i]`.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingBatch {
    pub vectors: Vec<EmbeddingVector>,
    /// Model calls actually made.
    pub calls: usize,
    /// Rate-limit pauses taken.
    pub pauses: usize,
    /// Records left with an empty vector.
    pub failures: usize,
}

/// Text sent to the model: the headline unless it is blank, else the story.
/// `None` when both are blank.
pub fn source_text(record: &BillRecord) -> Option<&str> {
    if !record.headline.trim().is_empty() {
        Some(&record.headline)
    } else if !record.story.trim().is_empty() {
        Some(&record.story)
    } else {
        None
    }
}

/// Embeds every record, pausing before a call that would overflow the
/// rate-limit window.
///
/// The output has the same length and order as `records`. Records with no
/// text to embed are not sent to the model and count as failures.
///
/// # Errors
/// In [`FailureMode::Strict`], returns [`PipelineError::EmbeddingService`] on
/// the first failure; no further calls are made.
pub async fn generate_embeddings(
    records: &[BillRecord],
    model: &dyn EmbeddingModel,
    options: &GeneratorOptions,
) -> Result<EmbeddingBatch> {
    let mut window = RateLimitWindow::new(options.rate_limit);
    let mut batch = EmbeddingBatch {
        vectors: Vec::with_capacity(records.len()),
        ..EmbeddingBatch::default()
    };

    for (index, record) in records.iter().enumerate() {
        let Some(text) = source_text(record) else {
            absorb(&mut batch, index, Err(EmbeddingServiceError::EmptyInput), options)?;
            continue;
        };

        window.acquire().await;
        batch.calls += 1;
        let result = model.embed(text).await;
        absorb(&mut batch, index, result, options)?;
    }

    batch.pauses = window.pauses();
    info!(
        records = records.len(),
        calls = batch.calls,
        pauses = batch.pauses,
        failures = batch.failures,
        "embedding generation finished"
    );
    Ok(batch)
}

/// Appends the outcome of one record to `batch`, or aborts in strict mode.
fn absorb(
    batch: &mut EmbeddingBatch,
    index: usize,
    outcome: std::result::Result<EmbeddingVector, EmbeddingServiceError>,
    options: &GeneratorOptions,
) -> Result<()> {
    match outcome {
        Ok(vector) => {
            debug!(index, dim = vector.len(), "record embedded");
            batch.vectors.push(vector);
            Ok(())
        }
        Err(source) => match options.failure_mode {
            FailureMode::Lenient => {
                warn!(index, error = %source, "embedding failed, storing empty vector");
                batch.failures += 1;
                batch.vectors.push(Vec::new());
                Ok(())
            }
            FailureMode::Strict => Err(PipelineError::EmbeddingService { index, source }),
        },
    }
}
