use std::{fmt, str::FromStr};

/// Backend that produces embeddings.
///
/// Adding a provider means a new variant here, a client under `services/`,
/// and a dispatch arm in [`EmbeddingClient`](crate::EmbeddingClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmbeddingProvider {
    /// Google Vertex AI text embedding models (`textembedding-gecko@001`, ...).
    #[default]
    Vertex,
    /// OpenAI or any OpenAI-compatible `/v1/embeddings` endpoint.
    OpenAI,
    /// Local Ollama runtime.
    Ollama,
}

impl FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertex" | "vertexai" | "google" => Ok(Self::Vertex),
            "openai" | "chatgpt" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!(
                "unsupported provider `{other}` (expected vertex|openai|ollama)"
            )),
        }
    }
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        })
    }
}
