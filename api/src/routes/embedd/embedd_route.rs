//! GET /embedd - runs the bill embedding pipeline once, synchronously.

use std::sync::Arc;

use axum::extract::{Query, State, rejection::QueryRejection};
use bill_pipeline::run_pipeline;
use chrono::Utc;
use tracing::{info, instrument};

use crate::{
    core::app_state::AppState, error_handler::AppResult,
    routes::embedd::embedd_request::EmbeddRequest,
};

/// Handler: GET /embedd
///
/// # Example
/// ```bash
/// curl 'http://127.0.0.1:8080/embedd?filter_date=2024-03-01'
/// ```
#[instrument(name = "embedd", skip_all)]
pub async fn embedd(
    State(state): State<Arc<AppState>>,
    query: Result<Query<EmbeddRequest>, QueryRejection>,
) -> AppResult<String> {
    let Query(request) = query?;
    let today = Utc::now().date_naive();
    let threshold = request.threshold(today, state.lookback_days)?;

    info!(%threshold, "embedding run requested");

    let report = run_pipeline(
        state.source.as_ref(),
        state.model.as_ref(),
        state.sink.as_ref(),
        &state.generator,
        threshold,
        today,
    )
    .await?;

    Ok(report.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{http::StatusCode, response::IntoResponse};
    use bill_core::{
        EmbeddedBill, EmbeddingModel, EmbeddingServiceError, EmbeddingVector, QueryError,
        RawBillRow, RowSource, SinkWriteError,
    };
    use bill_pipeline::{BillSink, GeneratorOptions, SinkOutcome};
    use chrono::NaiveDate;

    use super::*;

    struct Rows(Vec<RawBillRow>, Mutex<Vec<NaiveDate>>);

    #[async_trait]
    impl RowSource for Rows {
        async fn query(&self, threshold: NaiveDate) -> Result<Vec<RawBillRow>, QueryError> {
            self.1.lock().unwrap().push(threshold);
            Ok(self.0.clone())
        }
    }

    struct Len;

    #[async_trait]
    impl EmbeddingModel for Len {
        async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingServiceError> {
            Ok(vec![text.len() as f32])
        }
    }

    struct Table;

    #[async_trait]
    impl BillSink for Table {
        async fn write(
            &self,
            bills: &[EmbeddedBill],
            _run_date: NaiveDate,
        ) -> Result<SinkOutcome, SinkWriteError> {
            Ok(SinkOutcome::Inserted {
                rows: bills.len() as u64,
            })
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn state(rows: Vec<RawBillRow>) -> (Arc<AppState>, Arc<Rows>) {
        let source = Arc::new(Rows(rows, Mutex::new(Vec::new())));
        let state = AppState::new(
            source.clone(),
            Arc::new(Len),
            Arc::new(Table),
            GeneratorOptions::default(),
        );
        (Arc::new(state), source)
    }

    fn query(filter_date: Option<&str>) -> Result<Query<EmbeddRequest>, QueryRejection> {
        Ok(Query(EmbeddRequest {
            filter_date: filter_date.map(str::to_string),
        }))
    }

    #[tokio::test]
    async fn runs_pipeline_for_the_requested_date() {
        let (state, source) = state(vec![RawBillRow::Columns {
            headline: Some("Bill A\n".into()),
            story: None,
            social_text: None,
            inserted_date: day("2024-03-02"),
        }]);

        let body = embedd(State(state), query(Some("2024-03-01"))).await.unwrap();

        assert_eq!(source.1.lock().unwrap().as_slice(), &[day("2024-03-01")]);
        assert!(body.starts_with("Data processing and insert completed successfully."));
        assert!(body.contains("1 record(s) after 2024-03-01"));
    }

    #[tokio::test]
    async fn bad_date_is_400_and_skips_the_database() {
        let (state, source) = state(Vec::new());

        let err = embedd(State(state), query(Some("03/01/2024"))).await.unwrap_err();
        let resp = err.into_response();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(source.1.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_is_422() {
        let (state, _) = state(vec![RawBillRow::Serialized {
            payload: "{not json".into(),
            inserted_date: day("2024-03-02"),
        }]);

        let err = embedd(State(state), query(None)).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_says_ok() {
        assert_eq!(crate::routes::health_route::health().await, "ok");
    }
}
