//! Writes embedded bills to the output table.

use async_trait::async_trait;
use bill_core::{EmbeddedBill, RelationalSink, SinkWriteError};
use pgvector::Vector;
use sqlx::PgPool;
use tracing::{error, info, instrument, warn};

use crate::errors::Result;
use crate::ident::QualifiedName;

pub struct PgBillSink {
    pool: PgPool,
    table: QualifiedName,
    insert_sql: String,
}

impl PgBillSink {
    pub fn new(pool: PgPool, table: QualifiedName) -> Self {
        let insert_sql = insert_sql(&table);
        Self {
            pool,
            table,
            insert_sql,
        }
    }

    /// Inserts all rows in one transaction. Any failure rolls every row back.
    #[instrument(skip_all, fields(table = %self.table, rows = rows.len()))]
    pub async fn insert_all(&self, rows: &[EmbeddedBill]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;

        for (index, row) in rows.iter().enumerate() {
            let result = sqlx::query(&self.insert_sql)
                .bind(&row.record.headline)
                .bind(&row.record.story)
                .bind(&row.record.social_text)
                .bind(embedding_param(&row.embedding))
                .bind(row.record.inserted_date)
                .execute(&mut *tx)
                .await;

            match result {
                Ok(done) => written += done.rows_affected(),
                Err(e) => {
                    error!(index, error = %e, "insert failed, rolling back");
                    if let Err(rollback) = tx.rollback().await {
                        warn!(error = %rollback, "rollback failed, connection discarded");
                    }
                    return Err(e.into());
                }
            }
        }

        tx.commit().await?;
        info!(written, "embeddings inserted");
        Ok(written)
    }
}

#[async_trait]
impl RelationalSink for PgBillSink {
    async fn execute_batch(&self, rows: &[EmbeddedBill]) -> std::result::Result<u64, SinkWriteError> {
        Ok(self.insert_all(rows).await?)
    }
}

/// A failed (empty) embedding is stored as NULL rather than a zero-length vector.
fn embedding_param(embedding: &[f32]) -> Option<Vector> {
    (!embedding.is_empty()).then(|| Vector::from(embedding.to_vec()))
}

pub fn insert_sql(table: &QualifiedName) -> String {
    format!(
        "INSERT INTO {} (headline, story, social_text, embedding, inserted_date) \
         VALUES ($1, $2, $3, $4, $5)",
        table.quoted()
    )
}
