//! End-to-end run: read, normalize, embed, write.

use std::fmt;

use bill_core::{EmbeddedBill, EmbeddingModel, RowSource};
use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::errors::Result;
use crate::generator::{GeneratorOptions, generate_embeddings};
use crate::normalizer::normalize_rows;
use crate::sink::{BillSink, SinkOutcome};

/// Summary of a successful run, rendered as the HTTP response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub threshold: NaiveDate,
    pub records: usize,
    pub calls: usize,
    pub pauses: usize,
    pub failures: usize,
    pub sink: SinkOutcome,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headline = match self.sink {
            SinkOutcome::Exported { .. } => "Data processing and upload completed successfully.",
            SinkOutcome::Inserted { .. } => "Data processing and insert completed successfully.",
        };
        write!(
            f,
            "{headline} {} record(s) after {}, {} embedding call(s), {} failure(s), {} pause(s). {}.",
            self.records,
            self.threshold.format("%Y-%m-%d"),
            self.calls,
            self.failures,
            self.pauses,
            self.sink
        )
    }
}

/// Runs the pipeline once for records inserted after `threshold`.
///
/// `run_date` names date-derived outputs (the export file).
///
/// # Errors
/// Any [`PipelineError`](crate::PipelineError); nothing is written unless
/// every earlier step succeeded.
#[instrument(name = "bill_pipeline", skip_all, fields(%threshold, %run_date))]
pub async fn run_pipeline(
    source: &dyn RowSource,
    model: &dyn EmbeddingModel,
    sink: &dyn BillSink,
    options: &GeneratorOptions,
    threshold: NaiveDate,
    run_date: NaiveDate,
) -> Result<PipelineReport> {
    let rows = source.query(threshold).await?;
    info!(rows = rows.len(), "rows fetched");

    let records = normalize_rows(rows)?;
    let batch = generate_embeddings(&records, model, options).await?;

    let (calls, pauses, failures) = (batch.calls, batch.pauses, batch.failures);
    let bills: Vec<EmbeddedBill> = records
        .into_iter()
        .zip(batch.vectors)
        .map(|(record, embedding)| EmbeddedBill { record, embedding })
        .collect();

    let outcome = sink.write(&bills, run_date).await?;

    let report = PipelineReport {
        threshold,
        records: bills.len(),
        calls,
        pauses,
        failures,
        sink: outcome,
    };
    info!(records = report.records, failures, "pipeline finished");
    Ok(report)
}
