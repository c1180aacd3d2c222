//! Lightweight Ollama embeddings client.
//!
//! Uses `POST {endpoint}/api/embeddings` with `{"model", "prompt"}`; the
//! response carries a single `embedding` array.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    config::{embedding_model_config::EmbeddingModelConfig, embedding_provider::EmbeddingProvider},
    error_handler::{EmbeddingError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet},
};

pub struct OllamaService {
    client: reqwest::Client,
    cfg: EmbeddingModelConfig,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`EmbeddingError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: EmbeddingModelConfig) -> Result<Self, EmbeddingError> {
        if cfg.provider != EmbeddingProvider::Ollama {
            return Err(ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into());
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let url_embeddings = format!("{}/api/embeddings", endpoint.trim_end_matches('/'));

        Ok(Self {
            client,
            cfg,
            url_embeddings,
        })
    }

    /// Retrieves embeddings via `/api/embeddings`.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`EmbeddingError::HttpTransport`] for client errors
    /// - `Decode` if the response cannot be parsed, `EmptyResult` if the
    ///   model returned an empty vector
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        debug!("POST {}", self.url_embeddings);
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
            error!(%status, %url, %snippet, "Ollama /api/embeddings returned non-success status");
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `{{ embedding: number[] }}`"
                )),
            )
        })?;

        non_empty(out.embedding)
    }
}

// Ollama answers unknown or non-embedding models with `{"embedding": []}`.
fn non_empty(embedding: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
    if embedding.is_empty() {
        return Err(ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyResult).into());
    }
    Ok(embedding)
}

/* ==========================
HTTP payloads
========================== */

/// Request body for `/api/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body for `/api/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_prompt_field() {
        let body = EmbeddingsRequest {
            model: "nomic-embed-text",
            prompt: "Bill A",
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"model":"nomic-embed-text","prompt":"Bill A"}"#
        );
    }

    #[test]
    fn empty_embedding_is_rejected() {
        let out: EmbeddingsResponse = serde_json::from_str(r#"{"embedding": []}"#).unwrap();
        assert!(non_empty(out.embedding).is_err());
        assert_eq!(non_empty(vec![1.0]).unwrap(), vec![1.0]);
    }

    #[test]
    fn rejects_endpoint_without_scheme() {
        let cfg = EmbeddingModelConfig {
            provider: EmbeddingProvider::Ollama,
            model: "nomic-embed-text".into(),
            endpoint: "localhost:11434".into(),
            api_key: None,
            project_id: None,
            location: "us-central1".into(),
            timeout_secs: None,
        };
        let err = OllamaService::new(cfg).err().unwrap();
        assert!(err.to_string().contains("invalid endpoint"));
    }
}
