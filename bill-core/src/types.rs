use chrono::NaiveDate;

/// Ordered embedding values returned by the model.
///
/// The length is fixed by the model and not validated here. An empty vector
/// marks a record whose embedding call failed in lenient mode.
pub type EmbeddingVector = Vec<f32>;

/// One row as returned by the row source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBillRow {
    /// Free-text fields stored in their own columns. SQL `NULL` reads as `None`.
    Columns {
        headline: Option<String>,
        story: Option<String>,
        social_text: Option<String>,
        inserted_date: NaiveDate,
    },
    /// All free-text fields stored as one JSON object in a single column.
    Serialized {
        payload: String,
        inserted_date: NaiveDate,
    },
}

/// A normalized legislative bill. Text fields never contain line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillRecord {
    pub headline: String,
    pub story: String,
    pub social_text: String,
    pub inserted_date: NaiveDate,
}

/// A record with its embedding attached; what the sinks consume.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedBill {
    pub record: BillRecord,
    pub embedding: EmbeddingVector,
}

impl EmbeddedBill {
    /// `true` when the embedding call for this record failed (lenient mode).
    pub fn is_missing_embedding(&self) -> bool {
        self.embedding.is_empty()
    }
}
