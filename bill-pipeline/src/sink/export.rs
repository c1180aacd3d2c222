//! CSV export to object storage.
//!
//! The file is named `embeddings_bills_<YYYY-MM-DD>.csv` after the run date
//! and uploaded under `<prefix>/<file name>`. It is written into a scratch
//! directory that is removed when [`ExportSink::write`] returns.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use bill_core::{EmbeddedBill, ObjectStoreUploader, SinkWriteError};
use chrono::NaiveDate;
use tracing::{info, instrument};

use super::{BillSink, SinkOutcome};

/// Default object key folder.
pub const DEFAULT_EXPORT_PREFIX: &str = "embeddings-folder";

/// Shape and location of the exported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Folder part of the object key, without leading/trailing slashes.
    pub prefix: String,
    /// Write headline/story/social_text/inserted_date next to the vector.
    pub include_record: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            include_record: false,
        }
    }
}

/// `embeddings_bills_<YYYY-MM-DD>.csv`
pub fn export_file_name(run_date: NaiveDate) -> String {
    format!("embeddings_bills_{}.csv", run_date.format("%Y-%m-%d"))
}

/// `<prefix>/embeddings_bills_<YYYY-MM-DD>.csv`, or the bare file name when
/// the prefix is empty.
pub fn export_object_key(prefix: &str, run_date: NaiveDate) -> String {
    let prefix = prefix.trim_matches('/');
    let name = export_file_name(run_date);
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}

/// Renders the CSV body.
///
/// Default layout is a single `embedding` column with one `[v1, v2, ...]`
/// list per record; `include_record` prepends the record's own fields.
pub fn render_csv(bills: &[EmbeddedBill], include_record: bool) -> String {
    let mut out = String::new();
    if include_record {
        out.push_str("headline,story,social_text,inserted_date,embedding\n");
    } else {
        out.push_str("embedding\n");
    }

    for bill in bills {
        let vector = format_vector(&bill.embedding);
        if include_record {
            let r = &bill.record;
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                csv_field(&r.headline),
                csv_field(&r.story),
                csv_field(&r.social_text),
                r.inserted_date.format("%Y-%m-%d"),
                csv_field(&vector)
            );
        } else {
            let _ = writeln!(out, "{}", csv_field(&vector));
        }
    }
    out
}

/// `[v1, v2, ...]` with every value keeping its decimal point (`1.0`, not `1`).
fn format_vector(values: &[f32]) -> String {
    let mut s = String::with_capacity(values.len() * 12 + 2);
    s.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        let _ = write!(s, "{v:?}");
    }
    s.push(']');
    s
}

/// Quotes a field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Writes the batch as CSV and uploads it.
pub struct ExportSink {
    uploader: Arc<dyn ObjectStoreUploader>,
    options: ExportOptions,
}

impl ExportSink {
    pub fn new(uploader: Arc<dyn ObjectStoreUploader>, options: ExportOptions) -> Self {
        Self { uploader, options }
    }
}

#[async_trait]
impl BillSink for ExportSink {
    #[instrument(name = "export_sink", skip_all, fields(records = bills.len(), %run_date))]
    async fn write(
        &self,
        bills: &[EmbeddedBill],
        run_date: NaiveDate,
    ) -> Result<SinkOutcome, SinkWriteError> {
        let scratch = tempfile::Builder::new()
            .prefix("bill-export-")
            .tempdir()?;
        let local_path = scratch.path().join(export_file_name(run_date));
        let object_key = export_object_key(&self.options.prefix, run_date);

        let body = render_csv(bills, self.options.include_record);
        tokio::fs::write(&local_path, body.as_bytes()).await?;
        info!(path = %local_path.display(), bytes = body.len(), "export file written");

        let confirmation = self.uploader.upload(&local_path, &object_key).await?;
        info!(%object_key, "export uploaded");

        Ok(SinkOutcome::Exported {
            object_key,
            confirmation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bill_core::BillRecord;

    fn bill(headline: &str, embedding: Vec<f32>) -> EmbeddedBill {
        EmbeddedBill {
            record: BillRecord {
                headline: headline.into(),
                story: "Story".into(),
                social_text: "say \"hi\"".into(),
                inserted_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            },
            embedding,
        }
    }

    #[test]
    fn names_derive_from_run_date() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(export_file_name(d), "embeddings_bills_2024-01-05.csv");
        assert_eq!(
            export_object_key("embeddings-folder", d),
            "embeddings-folder/embeddings_bills_2024-01-05.csv"
        );
        assert_eq!(
            export_object_key("/nested/dir/", d),
            "nested/dir/embeddings_bills_2024-01-05.csv"
        );
        assert_eq!(export_object_key("", d), "embeddings_bills_2024-01-05.csv");
    }

    #[test]
    fn embedding_only_layout_quotes_lists() {
        let csv = render_csv(&[bill("A", vec![0.5, -1.25]), bill("B", vec![])], false);
        assert_eq!(csv, "embedding\n\"[0.5, -1.25]\"\n[]\n");
    }

    #[test]
    fn single_value_list_needs_no_quotes() {
        let csv = render_csv(&[bill("A", vec![1.0])], false);
        assert_eq!(csv, "embedding\n[1.0]\n");
    }

    #[test]
    fn whole_numbers_keep_their_decimal_point() {
        assert_eq!(format_vector(&[1.0, -2.0, 0.0, 0.125]), "[1.0, -2.0, 0.0, 0.125]");
        assert_eq!(format_vector(&[]), "[]");
    }

    #[test]
    fn full_layout_escapes_text_fields() {
        let csv = render_csv(&[bill("Tax, reform", vec![0.5])], true);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("headline,story,social_text,inserted_date,embedding")
        );
        assert_eq!(
            lines.next(),
            Some("\"Tax, reform\",Story,\"say \"\"hi\"\"\",2024-03-09,[0.5]")
        );
        assert_eq!(lines.next(), None);
    }
}
