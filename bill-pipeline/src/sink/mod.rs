//! Final destinations for embedded bills.

use std::fmt;

use async_trait::async_trait;
use bill_core::{EmbeddedBill, SinkWriteError};
use chrono::NaiveDate;

pub mod export;
pub mod insert;

pub use export::{ExportOptions, ExportSink};
pub use insert::InsertSink;

/// Where a successful run put its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    /// CSV uploaded to object storage.
    Exported {
        object_key: String,
        confirmation: String,
    },
    /// Rows inserted into the output table.
    Inserted { rows: u64 },
}

impl fmt::Display for SinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exported { confirmation, .. } => f.write_str(confirmation),
            Self::Inserted { rows } => write!(f, "Inserted {rows} row(s) into the output table"),
        }
    }
}

/// A sink consumes the whole embedded batch of one run.
#[async_trait]
pub trait BillSink: Send + Sync {
    /// Writes `bills`. `run_date` names date-derived outputs.
    async fn write(
        &self,
        bills: &[EmbeddedBill],
        run_date: NaiveDate,
    ) -> Result<SinkOutcome, SinkWriteError>;
}
