//! Reads bills inserted after a threshold date.

use async_trait::async_trait;
use bill_core::{QueryError, RawBillRow, RowSource};
use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{debug, info, instrument};

use crate::config::{SourceLayout, SourceSettings};
use crate::errors::Result;

pub struct PgBillSource {
    pool: PgPool,
    layout: SourceLayout,
    select_sql: String,
}

impl PgBillSource {
    pub fn new(pool: PgPool, settings: &SourceSettings) -> Self {
        let select_sql = select_sql(settings);
        debug!(sql = %select_sql, "bill source query prepared");
        Self {
            pool,
            layout: settings.layout.clone(),
            select_sql,
        }
    }

    /// Fetches rows whose date column is strictly after `threshold`, oldest first.
    #[instrument(skip(self))]
    pub async fn fetch_after(&self, threshold: NaiveDate) -> Result<Vec<RawBillRow>> {
        let rows = sqlx::query(&self.select_sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        let rows = rows
            .iter()
            .map(|row| decode_row(&self.layout, row))
            .collect::<Result<Vec<_>>>()?;

        info!(rows = rows.len(), "bill rows fetched");
        Ok(rows)
    }
}

#[async_trait]
impl RowSource for PgBillSource {
    async fn query(&self, threshold: NaiveDate) -> std::result::Result<Vec<RawBillRow>, QueryError> {
        Ok(self.fetch_after(threshold).await?)
    }
}

fn decode_row(layout: &SourceLayout, row: &PgRow) -> Result<RawBillRow> {
    Ok(match layout {
        SourceLayout::Columns { .. } => RawBillRow::Columns {
            headline: row.try_get(0)?,
            story: row.try_get(1)?,
            social_text: row.try_get(2)?,
            inserted_date: row.try_get(3)?,
        },
        SourceLayout::Serialized { .. } => RawBillRow::Serialized {
            // NULL payloads reach the normalizer as empty text and fail there.
            payload: row.try_get::<Option<String>, _>(0)?.unwrap_or_default(),
            inserted_date: row.try_get(1)?,
        },
    })
}

/// Builds the SELECT for `settings`. The threshold is always bound as `$1`.
///
/// Text columns are cast to `text` and the date column to `date`, so `varchar`,
/// `jsonb` and `timestamp` source columns decode the same way.
pub fn select_sql(settings: &SourceSettings) -> String {
    let date = settings.date_column.quoted();
    let fields = match &settings.layout {
        SourceLayout::Columns {
            headline,
            story,
            social_text,
        } => format!(
            "{}::text, {}::text, {}::text",
            headline.quoted(),
            story.quoted(),
            social_text.quoted()
        ),
        SourceLayout::Serialized { payload } => format!("{}::text", payload.quoted()),
    };
    format!(
        "SELECT {fields}, {date}::date FROM {} WHERE {date} > $1 ORDER BY {date}",
        settings.table.quoted()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{QualifiedName, SqlIdent};

    fn ident(s: &str) -> SqlIdent {
        SqlIdent::new(s).unwrap()
    }

    #[test]
    fn columns_layout_selects_three_texts_and_the_date() {
        let settings = SourceSettings {
            table: QualifiedName::parse("bills").unwrap(),
            date_column: ident("bills_inserted_date"),
            layout: SourceLayout::Columns {
                headline: ident("headline"),
                story: ident("title"),
                social_text: ident("twitter"),
            },
        };
        assert_eq!(
            select_sql(&settings),
            "SELECT \"headline\"::text, \"title\"::text, \"twitter\"::text, \
             \"bills_inserted_date\"::date FROM \"bills\" \
             WHERE \"bills_inserted_date\" > $1 ORDER BY \"bills_inserted_date\""
        );
    }

    #[test]
    fn serialized_layout_selects_payload() {
        let settings = SourceSettings {
            table: QualifiedName::parse("legis.bills").unwrap(),
            date_column: ident("date"),
            layout: SourceLayout::Serialized {
                payload: ident("bill_data"),
            },
        };
        let sql = select_sql(&settings);
        assert_eq!(
            sql,
            "SELECT \"bill_data\"::text, \"date\"::date FROM \"legis\".\"bills\" \
             WHERE \"date\" > $1 ORDER BY \"date\""
        );
        assert!(!sql.contains('\''), "no literal values in the statement");
    }
}
