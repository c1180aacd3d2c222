//! OpenAI embeddings client.
//!
//! Calls `POST {endpoint}/v1/embeddings` with `{"model", "input"}` and reads
//! the vector from `data[0].embedding`. Any OpenAI-compatible gateway works
//! as long as it honours the same shapes.
//!
//! Constructor validation:
//! - `cfg.provider` must be `EmbeddingProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::{embedding_model_config::EmbeddingModelConfig, embedding_provider::EmbeddingProvider},
    error_handler::{EmbeddingError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet},
};

/// Thin client for the OpenAI embeddings API.
///
/// Keeps a preconfigured `reqwest::Client` (timeout and bearer header).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: EmbeddingModelConfig,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not OpenAI
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`EmbeddingError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: EmbeddingModelConfig) -> Result<Self, EmbeddingError> {
        if cfg.provider != EmbeddingProvider::OpenAI {
            return Err(
                ProviderError::new(Provider::OpenAI, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_embeddings = format!("{}/v1/embeddings", endpoint.trim_end_matches('/'));

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_embeddings,
        })
    }

    /// Retrieves a single embeddings vector via `/v1/embeddings`.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`EmbeddingError::HttpTransport`] for client/network failures
    /// - `Decode` / `EmptyResult` if the JSON is not the expected shape
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, EmbeddingError> {
        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input,
        };

        debug!(
            model = %self.cfg.model,
            input_len = input.len(),
            "POST {}", self.url_embeddings
        );

        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "OpenAI /v1/embeddings returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: EmbeddingsResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode /v1/embeddings response"
                );
                return Err(ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `data[0].embedding`"
                    )),
                )
                .into());
            }
        };

        let embedding = first_embedding(out)?;

        debug!(
            model = %self.cfg.model,
            dim = embedding.len(),
            latency_ms = started.elapsed().as_millis(),
            "embeddings completed"
        );

        Ok(embedding)
    }
}

fn first_embedding(out: EmbeddingsResponse) -> Result<Vec<f32>, EmbeddingError> {
    out.data
        .into_iter()
        .next()
        .map(|item| item.embedding)
        .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyResult).into())
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Request body for `/v1/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response body for `/v1/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EmbeddingModelConfig {
        EmbeddingModelConfig {
            provider: EmbeddingProvider::OpenAI,
            model: "text-embedding-3-small".into(),
            endpoint: "https://api.openai.com/".into(),
            api_key: Some("sk-test".into()),
            project_id: None,
            location: "us-central1".into(),
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn builds_embeddings_url_without_double_slash() {
        let svc = OpenAiService::new(cfg()).unwrap();
        assert_eq!(svc.url_embeddings, "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn missing_key_is_rejected() {
        let mut c = cfg();
        c.api_key = None;
        let err = OpenAiService::new(c).unwrap_err();
        assert!(err.to_string().contains("API key is missing"));
    }

    #[test]
    fn decodes_first_embedding() {
        let raw = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,0.2,0.3]}],"model":"text-embedding-3-small"}"#;
        let out: EmbeddingsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_embedding(out).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn empty_data_is_an_error() {
        let out: EmbeddingsResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(first_embedding(out).is_err());
    }
}
