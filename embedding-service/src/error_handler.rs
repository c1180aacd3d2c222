//! Unified error handling for `embedding-service`.
//!
//! This module exposes a single top-level error type [`EmbeddingError`] for
//! the whole library. Provider-specific failures are grouped in
//! [`ProviderError`] so that every client reports the same shapes (HTTP
//! status with a body snippet, decode errors, missing credentials).
//!
//! All messages include the suffix `[Embedding Service]` to simplify
//! attribution in logs.

use std::fmt;

use bill_core::EmbeddingServiceError;
use reqwest::StatusCode;
use services::gcp_auth::AuthError;
use thiserror::Error;

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Top-level error for the `embedding-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Provider-specific failure (bad config, HTTP status, decode).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (connect, timeout, TLS).
    #[error("[Embedding Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Access token for Google Cloud could not be obtained.
    #[error("[Embedding Service] {0}")]
    Auth(#[from] AuthError),
}

impl From<EmbeddingError> for EmbeddingServiceError {
    fn from(err: EmbeddingError) -> Self {
        EmbeddingServiceError::Backend(Box::new(err))
    }
}

/// Which backend produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Vertex,
    OpenAI,
    Ollama,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Vertex => "Vertex AI",
            Provider::OpenAI => "OpenAI",
            Provider::Ollama => "Ollama",
        })
    }
}

/// Non-successful HTTP response from a provider.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    /// Trimmed, single-line prefix of the response body.
    pub snippet: String,
}

/// Provider failure kinds shared by every client.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    #[error("config does not select this provider")]
    InvalidProvider,

    #[error("API key is missing")]
    MissingApiKey,

    #[error("Google Cloud project id is missing")]
    MissingProject,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP {} from {}: {}", .0.status, .0.url, .0.snippet)]
    HttpStatus(HttpError),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("response contained no embedding")]
    EmptyResult,
}

/// Error raised by one provider client.
#[derive(Debug, Error)]
#[error("[Embedding Service] {provider}: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Builds a short single-line snippet of a response body for logs/errors.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 240;
    let flat: String = body
        .trim()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(MAX + 1)
        .collect();
    if flat.chars().count() > MAX {
        let mut cut: String = flat.chars().take(MAX).collect();
        cut.push('…');
        cut
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_single_line_and_bounded() {
        let body = format!("{{\n  \"error\": \"{}\"\n}}", "x".repeat(500));
        let s = make_snippet(&body);
        assert!(!s.contains('\n'));
        assert_eq!(s.chars().count(), 241);
        assert!(s.ends_with('…'));
        assert_eq!(make_snippet("  short  "), "short");
    }

    #[test]
    fn provider_error_message_names_the_provider() {
        let err = ProviderError::new(
            Provider::Vertex,
            ProviderErrorKind::HttpStatus(HttpError {
                status: StatusCode::TOO_MANY_REQUESTS,
                url: "https://x/predict".into(),
                snippet: "quota".into(),
            }),
        );
        assert_eq!(
            err.to_string(),
            "[Embedding Service] Vertex AI: HTTP 429 Too Many Requests from https://x/predict: quota"
        );
    }
}
