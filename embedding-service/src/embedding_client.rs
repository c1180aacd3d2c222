//! Provider dispatch.
//!
//! [`EmbeddingClient`] owns exactly one provider client chosen from
//! [`EmbeddingModelConfig::provider`] and implements the pipeline's
//! [`EmbeddingModel`] seam on top of it.

use std::sync::Arc;

use async_trait::async_trait;
use bill_core::{EmbeddingModel, EmbeddingServiceError, EmbeddingVector};
use services::gcp_auth::TokenProvider;
use tracing::info;

use crate::{
    config::{embedding_model_config::EmbeddingModelConfig, embedding_provider::EmbeddingProvider},
    error_handler::Result,
    services::{
        ollama_service::OllamaService, open_ai_service::OpenAiService,
        vertex_service::VertexService,
    },
};

pub enum EmbeddingClient {
    Vertex(VertexService),
    OpenAi(OpenAiService),
    Ollama(OllamaService),
}

impl EmbeddingClient {
    /// Builds the client for `cfg.provider`.
    ///
    /// `tokens` is only consulted by the Vertex AI client; other providers
    /// authenticate with their own settings.
    pub fn from_config(cfg: EmbeddingModelConfig, tokens: Arc<TokenProvider>) -> Result<Self> {
        info!(provider = %cfg.provider, model = %cfg.model, "building embedding client");
        Ok(match cfg.provider {
            EmbeddingProvider::Vertex => Self::Vertex(VertexService::new(cfg, tokens)?),
            EmbeddingProvider::OpenAI => Self::OpenAi(OpenAiService::new(cfg)?),
            EmbeddingProvider::Ollama => Self::Ollama(OllamaService::new(cfg)?),
        })
    }

    pub fn provider(&self) -> EmbeddingProvider {
        match self {
            Self::Vertex(_) => EmbeddingProvider::Vertex,
            Self::OpenAi(_) => EmbeddingProvider::OpenAI,
            Self::Ollama(_) => EmbeddingProvider::Ollama,
        }
    }

    /// Embeds one text with the configured provider.
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            Self::Vertex(svc) => svc.embeddings(text).await,
            Self::OpenAi(svc) => svc.embeddings(text).await,
            Self::Ollama(svc) => svc.embeddings(text).await,
        }
    }
}

#[async_trait]
impl EmbeddingModel for EmbeddingClient {
    async fn embed(&self, text: &str) -> std::result::Result<EmbeddingVector, EmbeddingServiceError> {
        if text.trim().is_empty() {
            return Err(EmbeddingServiceError::EmptyInput);
        }
        Ok(self.embed_text(text).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama_cfg() -> EmbeddingModelConfig {
        EmbeddingModelConfig {
            provider: EmbeddingProvider::Ollama,
            model: "nomic-embed-text".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            project_id: None,
            location: "us-central1".into(),
            timeout_secs: Some(5),
        }
    }

    fn tokens() -> Arc<TokenProvider> {
        Arc::new(TokenProvider::with_static("token").unwrap())
    }

    #[test]
    fn dispatches_on_configured_provider() {
        let client = EmbeddingClient::from_config(ollama_cfg(), tokens()).unwrap();
        assert_eq!(client.provider(), EmbeddingProvider::Ollama);

        let vertex = EmbeddingModelConfig {
            provider: EmbeddingProvider::Vertex,
            endpoint: "https://us-central1-aiplatform.googleapis.com".into(),
            project_id: Some("civic-data".into()),
            ..ollama_cfg()
        };
        let client = EmbeddingClient::from_config(vertex, tokens()).unwrap();
        assert_eq!(client.provider(), EmbeddingProvider::Vertex);
    }

    #[tokio::test]
    async fn blank_text_never_reaches_the_backend() {
        let client = EmbeddingClient::from_config(ollama_cfg(), tokens()).unwrap();
        let err = client.embed("  \n ").await.unwrap_err();
        assert!(matches!(err, EmbeddingServiceError::EmptyInput));
    }
}
