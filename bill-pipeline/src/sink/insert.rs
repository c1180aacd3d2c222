//! Insert-mode sink: hands the whole batch to a [`RelationalSink`] in one call.

use std::sync::Arc;

use async_trait::async_trait;
use bill_core::{EmbeddedBill, RelationalSink, SinkWriteError};
use chrono::NaiveDate;
use tracing::{info, instrument};

use super::{BillSink, SinkOutcome};

pub struct InsertSink {
    sink: Arc<dyn RelationalSink>,
}

impl InsertSink {
    pub fn new(sink: Arc<dyn RelationalSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl BillSink for InsertSink {
    #[instrument(name = "insert_sink", skip_all, fields(records = bills.len()))]
    async fn write(
        &self,
        bills: &[EmbeddedBill],
        _run_date: NaiveDate,
    ) -> Result<SinkOutcome, SinkWriteError> {
        let missing = bills.iter().filter(|b| b.is_missing_embedding()).count();
        let rows = self.sink.execute_batch(bills).await?;
        info!(rows, missing_embeddings = missing, "batch inserted");
        Ok(SinkOutcome::Inserted { rows })
    }
}
