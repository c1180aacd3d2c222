//! Turns raw source rows into [`BillRecord`]s.
//!
//! Line breaks are removed (not replaced) from every free-text field. Rows in
//! the serialized layout carry a JSON object that is deserialized into a typed
//! payload; one bad payload fails the whole batch.

use bill_core::{BillRecord, RawBillRow};
use serde::Deserialize;
use tracing::debug;

use crate::errors::{PipelineError, Result};

/// Text fields of a serialized bill. `title`/`twitter` are the legacy column
/// names of the same fields.
#[derive(Debug, Default, Deserialize)]
struct BillPayload {
    #[serde(default)]
    headline: Option<String>,
    #[serde(default, alias = "title")]
    story: Option<String>,
    #[serde(default, alias = "twitter")]
    social_text: Option<String>,
}

/// Normalizes every row, preserving order.
///
/// # Errors
/// Returns [`PipelineError::MalformedRecord`] for the first serialized row
/// whose payload is not a JSON object with string (or null) text fields.
pub fn normalize_rows(rows: Vec<RawBillRow>) -> Result<Vec<BillRecord>> {
    let total = rows.len();
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| normalize_row(index, row))
        .collect::<Result<Vec<_>>>()?;

    debug!(total, "rows normalized");
    Ok(records)
}

fn normalize_row(index: usize, row: RawBillRow) -> Result<BillRecord> {
    match row {
        RawBillRow::Columns {
            headline,
            story,
            social_text,
            inserted_date,
        } => Ok(build_record(headline, story, social_text, inserted_date)),
        RawBillRow::Serialized {
            payload,
            inserted_date,
        } => {
            let parsed: BillPayload =
                serde_json::from_str(&payload).map_err(|e| PipelineError::MalformedRecord {
                    index,
                    reason: e.to_string(),
                })?;
            Ok(build_record(
                parsed.headline,
                parsed.story,
                parsed.social_text,
                inserted_date,
            ))
        }
    }
}

fn build_record(
    headline: Option<String>,
    story: Option<String>,
    social_text: Option<String>,
    inserted_date: chrono::NaiveDate,
) -> BillRecord {
    BillRecord {
        headline: strip_line_breaks(headline.as_deref().unwrap_or_default()),
        story: strip_line_breaks(story.as_deref().unwrap_or_default()),
        social_text: strip_line_breaks(social_text.as_deref().unwrap_or_default()),
        inserted_date,
    }
}

/// Removes `\n` and `\r` without inserting a separator.
pub fn strip_line_breaks(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}
