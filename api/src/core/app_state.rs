use std::sync::Arc;

use bill_core::{EmbeddingModel, RowSource};
use bill_pipeline::{
    BillSink, GeneratorOptions, PipelineConfig, SinkMode,
    sink::{ExportSink, InsertSink},
};
use bill_store::{PgBillSink, PgBillSource, StoreConfig};
use cloud_storage::{GcsUploader, StorageConfig};
use embedding_service::EmbeddingClient;
use services::{
    env::{ConfigError, env_parse},
    gcp_auth::TokenProvider,
};
use tracing::info;

use crate::error_handler::AppError;

/// Default look-back when `/embedd` is called without `filter_date`.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 8;

/// Shared state for all HTTP handlers.
///
/// Collaborators are trait objects so tests can run the real handler against
/// in-memory stubs. Nothing in here is mutated by a request.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn RowSource>,
    pub model: Arc<dyn EmbeddingModel>,
    pub sink: Arc<dyn BillSink>,
    pub generator: GeneratorOptions,
    /// Days subtracted from today when no `filter_date` is given.
    pub lookback_days: u32,
}

impl AppState {
    pub fn new(
        source: Arc<dyn RowSource>,
        model: Arc<dyn EmbeddingModel>,
        sink: Arc<dyn BillSink>,
        generator: GeneratorOptions,
    ) -> Self {
        Self {
            source,
            model,
            sink,
            generator,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// Wires Postgres, the embedding provider and the configured sink from
    /// environment variables.
    ///
    /// No network traffic happens here: the pool connects lazily and tokens
    /// are fetched on first use.
    pub fn from_env() -> Result<Self, AppError> {
        let pipeline = PipelineConfig::from_env()?;
        let store = StoreConfig::from_env()?;
        let pool = bill_store::connect_lazy(&store)?;
        let tokens = Arc::new(TokenProvider::from_env()?);

        let model = EmbeddingClient::from_config(embedding_service::config_from_env()?, tokens.clone())?;

        let sink: Arc<dyn BillSink> = match pipeline.sink_mode {
            SinkMode::Export => {
                let uploader = GcsUploader::new(StorageConfig::from_env()?, tokens)?;
                Arc::new(ExportSink::new(Arc::new(uploader), pipeline.export.clone()))
            }
            SinkMode::Insert => {
                let table = store
                    .dest_table
                    .clone()
                    .ok_or(ConfigError::MissingVar("DEST_TABLE"))?;
                Arc::new(InsertSink::new(Arc::new(PgBillSink::new(pool.clone(), table))))
            }
        };

        let lookback_days = env_parse::<u32>("FILTER_LOOKBACK_DAYS")?.unwrap_or(DEFAULT_LOOKBACK_DAYS);

        info!(
            sink_mode = %pipeline.sink_mode,
            failure_mode = %pipeline.generator.failure_mode,
            provider = %model.provider(),
            source_table = %store.source.table,
            calls_per_window = pipeline.generator.rate_limit.calls_per_window(),
            pause_secs = pipeline.generator.rate_limit.pause().as_secs(),
            lookback_days,
            "application state ready"
        );

        Ok(Self::new(
            Arc::new(PgBillSource::new(pool, &store.source)),
            Arc::new(model),
            sink,
            pipeline.generator,
        )
        .with_lookback_days(lookback_days))
    }
}
