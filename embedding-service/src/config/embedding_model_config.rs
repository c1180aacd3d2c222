use crate::config::embedding_provider::EmbeddingProvider;

/// Configuration for one embedding model.
///
/// # Fields
///
/// - `provider`: Which backend to call.
/// - `model`: Model identifier (e.g., `"textembedding-gecko@001"`,
///   `"text-embedding-3-small"`, `"nomic-embed-text"`).
/// - `endpoint`: Base URL of the API, without the operation path.
/// - `api_key`: Key for providers that use static keys (OpenAI).
/// - `project_id` / `location`: Google Cloud project and region (Vertex AI).
/// - `timeout_secs`: Per-request timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingModelConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub location: String,
    pub timeout_secs: Option<u64>,
}
