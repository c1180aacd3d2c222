use bill_core::SinkWriteError;
use reqwest::StatusCode;
use services::gcp_auth::AuthError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("[Cloud Storage] cannot read `{path}`: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[Cloud Storage] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("[Cloud Storage] {0}")]
    Auth(#[from] AuthError),

    #[error("[Cloud Storage] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },
}

impl From<StorageError> for SinkWriteError {
    fn from(err: StorageError) -> Self {
        SinkWriteError::Upload(Box::new(err))
    }
}
