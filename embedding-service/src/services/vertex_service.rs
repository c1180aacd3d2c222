//! Vertex AI text embedding client.
//!
//! Calls the publisher model `:predict` endpoint:
//! `POST {endpoint}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:predict`
//! with body `{"instances":[{"content": "..."}]}`; the vector is read from
//! `predictions[0].embeddings.values`.
//!
//! Authentication uses a bearer token from [`TokenProvider`], fetched per
//! request (the provider caches it).

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use services::gcp_auth::TokenProvider;
use tracing::{debug, error, info};

use crate::{
    config::{embedding_model_config::EmbeddingModelConfig, embedding_provider::EmbeddingProvider},
    error_handler::{EmbeddingError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet},
};

/// Thin client for Vertex AI text embeddings.
#[derive(Debug)]
pub struct VertexService {
    client: reqwest::Client,
    cfg: EmbeddingModelConfig,
    tokens: Arc<TokenProvider>,
    url_predict: String,
}

impl VertexService {
    /// Creates a new [`VertexService`].
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Vertex
    /// - `MissingProject` if `cfg.project_id` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is not http/https
    /// - [`EmbeddingError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: EmbeddingModelConfig, tokens: Arc<TokenProvider>) -> Result<Self, EmbeddingError> {
        if cfg.provider != EmbeddingProvider::Vertex {
            return Err(ProviderError::new(Provider::Vertex, ProviderErrorKind::InvalidProvider).into());
        }

        let project = cfg
            .project_id
            .clone()
            .ok_or_else(|| ProviderError::new(Provider::Vertex, ProviderErrorKind::MissingProject))?;

        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ProviderError::new(
                Provider::Vertex,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(60));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let url_predict = predict_url(endpoint, &project, &cfg.location, &cfg.model);

        info!(
            model = %cfg.model,
            project = %project,
            location = %cfg.location,
            timeout_secs = timeout.as_secs(),
            "VertexService initialized"
        );

        Ok(Self {
            client,
            cfg,
            tokens,
            url_predict,
        })
    }

    /// Embeds a single text and returns its vector.
    ///
    /// # Errors
    /// - [`EmbeddingError::Auth`] if no access token can be obtained
    /// - [`EmbeddingError::HttpTransport`] for client/network failures
    /// - `HttpStatus` for non-2xx responses (quota errors arrive as 429)
    /// - `Decode` / `EmptyResult` for unexpected payloads
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, EmbeddingError> {
        let started = Instant::now();
        let token = self.tokens.access_token().await?;
        let body = PredictRequest {
            instances: [Instance { content: input }],
        };

        debug!(model = %self.cfg.model, input_len = input.len(), "POST {}", self.url_predict);

        let resp = self
            .client
            .post(&self.url_predict)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_predict.clone();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "Vertex AI :predict returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::Vertex,
                ProviderErrorKind::HttpStatus(HttpError { status, url, snippet }),
            )
            .into());
        }

        let out: PredictResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Vertex,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `predictions[0].embeddings.values`"
                )),
            )
        })?;

        let values = first_vector(out)?;
        debug!(
            model = %self.cfg.model,
            dim = values.len(),
            latency_ms = started.elapsed().as_millis(),
            "embedding completed"
        );
        Ok(values)
    }
}

fn predict_url(endpoint: &str, project: &str, location: &str, model: &str) -> String {
    format!(
        "{}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:predict",
        endpoint.trim_end_matches('/')
    )
}

fn first_vector(out: PredictResponse) -> Result<Vec<f32>, EmbeddingError> {
    out.predictions
        .into_iter()
        .next()
        .map(|p| p.embeddings.values)
        .ok_or_else(|| ProviderError::new(Provider::Vertex, ProviderErrorKind::EmptyResult).into())
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Instance<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    embeddings: PredictionEmbeddings,
}

#[derive(Debug, Deserialize)]
struct PredictionEmbeddings {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_publisher_model_url() {
        assert_eq!(
            predict_url(
                "https://us-central1-aiplatform.googleapis.com/",
                "civic-data",
                "us-central1",
                "textembedding-gecko@001"
            ),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/civic-data/locations/us-central1/publishers/google/models/textembedding-gecko@001:predict"
        );
    }

    #[test]
    fn request_wraps_text_in_one_instance() {
        let body = PredictRequest {
            instances: [Instance { content: "Bill A" }],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"instances":[{"content":"Bill A"}]}"#
        );
    }

    #[test]
    fn reads_values_of_first_prediction() {
        let raw = r#"{
            "predictions": [
                {"embeddings": {"statistics": {"truncated": false, "token_count": 3}, "values": [0.25, -0.5]}}
            ],
            "metadata": {"billableCharacterCount": 6}
        }"#;
        let out: PredictResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_vector(out).unwrap(), vec![0.25, -0.5]);
    }

    #[test]
    fn empty_predictions_is_an_error() {
        let out: PredictResponse = serde_json::from_str(r#"{"predictions": []}"#).unwrap();
        let err = first_vector(out).unwrap_err();
        assert!(err.to_string().contains("no embedding"));
    }

    #[test]
    fn rejects_config_for_other_provider() {
        let cfg = EmbeddingModelConfig {
            provider: EmbeddingProvider::Ollama,
            model: "m".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            project_id: Some("p".into()),
            location: "us-central1".into(),
            timeout_secs: None,
        };
        let tokens = Arc::new(TokenProvider::with_static("t").unwrap());
        assert!(VertexService::new(cfg, tokens).is_err());
    }
}
