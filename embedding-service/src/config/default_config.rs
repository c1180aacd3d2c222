//! Embedding model config loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! Common:
//! - `EMBEDDING_PROVIDER`     = `vertex` (default), `openai`, `ollama`
//! - `EMBEDDING_MODEL`        = model id (provider-specific default)
//! - `EMBEDDING_ENDPOINT`     = base URL override
//! - `EMBEDDING_TIMEOUT_SECS` = per-request timeout (default 30)
//!
//! Vertex AI:
//! - `PROJECT_ID`  (mandatory)
//! - `LOCATION_ID` (default `us-central1`)
//!
//! OpenAI:
//! - `OPENAI_API_KEY` (mandatory)
//!
//! Ollama:
//! - `OLLAMA_URL` or `OLLAMA_PORT` (default `http://localhost:11434`)

use services::env::{ConfigError, env_opt, parse_var};

use crate::config::{
    embedding_model_config::EmbeddingModelConfig, embedding_provider::EmbeddingProvider,
};

const DEFAULT_LOCATION: &str = "us-central1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builds the embedding config from the process environment.
///
/// # Errors
/// - [`ConfigError::MissingVar`] for provider-mandatory variables
/// - [`ConfigError::InvalidValue`] for unknown providers, bad numbers, or
///   endpoints without an http/https scheme
pub fn config_from_env() -> Result<EmbeddingModelConfig, ConfigError> {
    config_from_lookup(|name| env_opt(name))
}

/// Same as [`config_from_env`], reading variables through `lookup`.
pub fn config_from_lookup<F>(lookup: F) -> Result<EmbeddingModelConfig, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let provider = match lookup("EMBEDDING_PROVIDER") {
        Some(raw) => raw
            .parse::<EmbeddingProvider>()
            .map_err(|reason| ConfigError::InvalidValue {
                var: "EMBEDDING_PROVIDER",
                reason,
            })?,
        None => EmbeddingProvider::default(),
    };

    let timeout_secs = parse_var::<u64>("EMBEDDING_TIMEOUT_SECS", lookup("EMBEDDING_TIMEOUT_SECS"))?
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let location = lookup("LOCATION_ID").unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    let (default_model, default_endpoint) = match provider {
        EmbeddingProvider::Vertex => (
            "textembedding-gecko@001",
            format!("https://{location}-aiplatform.googleapis.com"),
        ),
        EmbeddingProvider::OpenAI => ("text-embedding-3-small", "https://api.openai.com".into()),
        EmbeddingProvider::Ollama => ("nomic-embed-text", ollama_endpoint(&lookup)?),
    };

    let endpoint = lookup("EMBEDDING_ENDPOINT").unwrap_or(default_endpoint);
    validate_http_endpoint("EMBEDDING_ENDPOINT", &endpoint)?;

    let project_id = lookup("PROJECT_ID");
    if provider == EmbeddingProvider::Vertex && project_id.is_none() {
        return Err(ConfigError::MissingVar("PROJECT_ID"));
    }

    let api_key = lookup("OPENAI_API_KEY");
    if provider == EmbeddingProvider::OpenAI && api_key.is_none() {
        return Err(ConfigError::MissingVar("OPENAI_API_KEY"));
    }

    Ok(EmbeddingModelConfig {
        provider,
        model: lookup("EMBEDDING_MODEL").unwrap_or_else(|| default_model.to_string()),
        endpoint,
        api_key,
        project_id,
        location,
        timeout_secs: Some(timeout_secs),
    })
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. `http://localhost:11434`
fn ollama_endpoint<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    if let Some(url) = lookup("OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = parse_var::<u16>("OLLAMA_PORT", lookup("OLLAMA_PORT"))? {
        return Ok(format!("http://localhost:{port}"));
    }
    Ok("http://localhost:11434".into())
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
fn validate_http_endpoint(var: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            var,
            reason: "must start with http:// or https://".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(
        vars: &'a HashMap<&'static str, &'static str>,
    ) -> impl Fn(&'static str) -> Option<String> + 'a {
        move |name| vars.get(name).map(|v| v.to_string())
    }

    #[test]
    fn vertex_is_the_default_provider() {
        let vars = HashMap::from([("PROJECT_ID", "civic-data"), ("LOCATION_ID", "europe-west1")]);
        let cfg = config_from_lookup(lookup(&vars)).unwrap();

        assert_eq!(cfg.provider, EmbeddingProvider::Vertex);
        assert_eq!(cfg.model, "textembedding-gecko@001");
        assert_eq!(cfg.endpoint, "https://europe-west1-aiplatform.googleapis.com");
        assert_eq!(cfg.project_id.as_deref(), Some("civic-data"));
        assert_eq!(cfg.timeout_secs, Some(30));
    }

    #[test]
    fn vertex_requires_project() {
        let vars = HashMap::new();
        let err = config_from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("PROJECT_ID")));
    }

    #[test]
    fn openai_requires_key() {
        let vars = HashMap::from([("EMBEDDING_PROVIDER", "openai")]);
        let err = config_from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("OPENAI_API_KEY")));
    }

    #[test]
    fn ollama_port_builds_local_endpoint() {
        let vars = HashMap::from([
            ("EMBEDDING_PROVIDER", "ollama"),
            ("OLLAMA_PORT", "11500"),
            ("EMBEDDING_MODEL", "bge-m3"),
        ]);
        let cfg = config_from_lookup(lookup(&vars)).unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:11500");
        assert_eq!(cfg.model, "bge-m3");
    }

    #[test]
    fn rejects_endpoint_without_scheme() {
        let vars = HashMap::from([
            ("EMBEDDING_PROVIDER", "ollama"),
            ("EMBEDDING_ENDPOINT", "localhost:11434"),
        ]);
        assert!(matches!(
            config_from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidValue {
                var: "EMBEDDING_ENDPOINT",
                ..
            })
        ));
    }

    #[test]
    fn rejects_unknown_provider() {
        let vars = HashMap::from([("EMBEDDING_PROVIDER", "bedrock")]);
        assert!(matches!(
            config_from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidValue {
                var: "EMBEDDING_PROVIDER",
                ..
            })
        ));
    }

    #[test]
    fn rejects_non_numeric_port_and_timeout() {
        let vars = HashMap::from([("EMBEDDING_PROVIDER", "ollama"), ("OLLAMA_PORT", "99999")]);
        assert!(matches!(
            config_from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidValue { var: "OLLAMA_PORT", .. })
        ));

        let vars = HashMap::from([("PROJECT_ID", "civic-data"), ("EMBEDDING_TIMEOUT_SECS", "-1")]);
        assert!(matches!(
            config_from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidValue { var: "EMBEDDING_TIMEOUT_SECS", .. })
        ));
    }
}
