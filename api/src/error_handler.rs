use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bill_pipeline::PipelineError;
use bill_store::StoreError;
use cloud_storage::StorageError;
use embedding_service::EmbeddingError;
use services::{env::ConfigError, gcp_auth::AuthError};
use thiserror::Error;
use tracing::error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,

            AppError::Pipeline(PipelineError::MalformedRecord { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Pipeline(
                PipelineError::Query(_)
                | PipelineError::EmbeddingService { .. }
                | PipelineError::SinkWrite(_),
            ) => StatusCode::BAD_GATEWAY,

            // startup-only
            AppError::Config(_)
            | AppError::Store(_)
            | AppError::Embedding(_)
            | AppError::Storage(_)
            | AppError::Auth(_)
            | AppError::Bind(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(%status, error = %self, "request failed");
        (status, format!("An error occurred: {self}")).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(err: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use bill_core::{EmbeddingServiceError, QueryError, SinkWriteError};

    use super::*;

    #[test]
    fn pipeline_failures_are_never_2xx() {
        let cases = [
            (
                AppError::from(PipelineError::Query(QueryError::Database("down".into()))),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::from(PipelineError::MalformedRecord {
                    index: 2,
                    reason: "expected value".into(),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(PipelineError::EmbeddingService {
                    index: 0,
                    source: EmbeddingServiceError::EmptyInput,
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::from(PipelineError::SinkWrite(SinkWriteError::Upload("403".into()))),
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::BadRequest("filter_date".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn body_echoes_the_message() {
        let resp = AppError::BadRequest("invalid filter_date `x`".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers()[axum::http::header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
