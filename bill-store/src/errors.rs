use bill_core::{QueryError, SinkWriteError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("[Bill Store] invalid SQL identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("[Bill Store] {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        QueryError::Database(Box::new(err))
    }
}

impl From<StoreError> for SinkWriteError {
    fn from(err: StoreError) -> Self {
        SinkWriteError::Database(Box::new(err))
    }
}
