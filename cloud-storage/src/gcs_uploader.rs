//! Google Cloud Storage uploader.
//!
//! Single-request media upload through the JSON API:
//! `POST {endpoint}/upload/storage/v1/b/{bucket}/o?uploadType=media&name={key}`
//! with the file bytes as body. Export files are small (one line per bill),
//! so resumable uploads are not needed.

use std::{
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use bill_core::{ObjectStoreUploader, SinkWriteError};
use reqwest::header;
use serde::Deserialize;
use services::gcp_auth::TokenProvider;
use tracing::{debug, error, info, instrument};

use crate::{
    config::StorageConfig,
    errors::{Result, StorageError},
};

#[derive(Debug)]
pub struct GcsUploader {
    client: reqwest::Client,
    cfg: StorageConfig,
    tokens: Arc<TokenProvider>,
    url_upload: String,
}

impl GcsUploader {
    pub fn new(cfg: StorageConfig, tokens: Arc<TokenProvider>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        let url_upload = upload_url(&cfg.endpoint, &cfg.bucket);

        info!(bucket = %cfg.bucket, endpoint = %cfg.endpoint, "GcsUploader initialized");

        Ok(Self {
            client,
            cfg,
            tokens,
            url_upload,
        })
    }

    /// Uploads `local_path` as object `key` and returns the confirmation line.
    #[instrument(skip(self), fields(bucket = %self.cfg.bucket))]
    pub async fn upload_file(&self, local_path: &Path, key: &str) -> Result<String> {
        let started = Instant::now();
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|source| StorageError::ReadFile {
                path: local_path.display().to_string(),
                source,
            })?;
        let token = self.tokens.access_token().await?;

        debug!(size = bytes.len(), "POST {}", self.url_upload);

        let resp = self
            .client
            .post(&self.url_upload)
            .query(&[("uploadType", "media"), ("name", key)])
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, content_type(key))
            .body(bytes)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_upload.clone();
            let snippet: String = resp.text().await.unwrap_or_default().chars().take(240).collect();
            error!(%status, %url, %snippet, "Cloud Storage upload returned non-success status");
            return Err(StorageError::HttpStatus {
                status,
                url,
                snippet,
            });
        }

        // The object resource is informational only; a body we cannot parse
        // does not undo a successful upload.
        match resp.json::<ObjectResource>().await {
            Ok(obj) => debug!(name = %obj.name, size = ?obj.size, generation = ?obj.generation, "object stored"),
            Err(e) => debug!(error = %e, "upload response was not an object resource"),
        }

        info!(
            key,
            latency_ms = started.elapsed().as_millis(),
            "export file uploaded"
        );

        Ok(confirmation(local_path, &self.cfg.bucket, key))
    }
}

#[async_trait]
impl ObjectStoreUploader for GcsUploader {
    async fn upload(&self, local_path: &Path, key: &str) -> std::result::Result<String, SinkWriteError> {
        Ok(self.upload_file(local_path, key).await?)
    }
}

fn upload_url(endpoint: &str, bucket: &str) -> String {
    format!("{}/upload/storage/v1/b/{bucket}/o", endpoint.trim_end_matches('/'))
}

fn content_type(key: &str) -> &'static str {
    if key.ends_with(".csv") {
        "text/csv"
    } else {
        "application/octet-stream"
    }
}

fn confirmation(local_path: &Path, bucket: &str, key: &str) -> String {
    let file = local_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| local_path.display().to_string());
    format!("File {file} uploaded to GCS bucket {bucket} as {key}")
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    generation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploader() -> GcsUploader {
        let cfg = StorageConfig {
            bucket: "civic-embeddings".into(),
            endpoint: "http://localhost:4443".into(),
            timeout_secs: 5,
        };
        let tokens = Arc::new(TokenProvider::with_static("token").unwrap());
        GcsUploader::new(cfg, tokens).unwrap()
    }

    #[test]
    fn upload_url_targets_media_endpoint() {
        assert_eq!(
            uploader().url_upload,
            "http://localhost:4443/upload/storage/v1/b/civic-embeddings/o"
        );
    }

    #[test]
    fn object_name_is_query_encoded() {
        let up = uploader();
        let req = up
            .client
            .post(&up.url_upload)
            .query(&[("uploadType", "media"), ("name", "embeddings-folder/embeddings_bills_2024-03-15.csv")])
            .build()
            .unwrap();
        assert_eq!(
            req.url().query(),
            Some("uploadType=media&name=embeddings-folder%2Fembeddings_bills_2024-03-15.csv")
        );
    }

    #[test]
    fn confirmation_names_file_bucket_and_key() {
        let line = confirmation(
            Path::new("/tmp/.tmpAbc/embeddings_bills_2024-03-15.csv"),
            "civic-embeddings",
            "embeddings-folder/embeddings_bills_2024-03-15.csv",
        );
        assert_eq!(
            line,
            "File embeddings_bills_2024-03-15.csv uploaded to GCS bucket civic-embeddings as embeddings-folder/embeddings_bills_2024-03-15.csv"
        );
    }

    #[tokio::test]
    async fn missing_local_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = uploader()
            .upload_file(&dir.path().join("absent.csv"), "k.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ReadFile { .. }));
    }

    #[test]
    fn csv_keys_are_sent_as_text_csv() {
        assert_eq!(content_type("a/b.csv"), "text/csv");
        assert_eq!(content_type("a/b.bin"), "application/octet-stream");
    }
}
