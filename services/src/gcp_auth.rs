//! OAuth2 access tokens for Google Cloud REST APIs.
//!
//! Two sources are supported:
//! - a static token from `GOOGLE_ACCESS_TOKEN` (local development,
//!   e.g. `gcloud auth print-access-token`);
//! - the GCE/Cloud Run metadata server
//!   (`GET http://{GCE_METADATA_HOST}/computeMetadata/v1/instance/service-accounts/default/token`).
//!
//! Metadata tokens are cached and refreshed shortly before they expire.

use std::time::{Duration, Instant};

use reqwest::{StatusCode, header};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::env::env_opt;

const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before the reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Errors produced while obtaining an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("[GCP Auth] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("[GCP Auth] metadata server returned HTTP {status}: {snippet}")]
    HttpStatus { status: StatusCode, snippet: String },

    #[error("[GCP Auth] failed to decode token response: {0}")]
    Decode(String),
}

#[derive(Debug)]
enum TokenSource {
    Static(String),
    Metadata { url: String },
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

/// Shared access-token provider. Construct once and share behind an `Arc`.
#[derive(Debug)]
pub struct TokenProvider {
    client: reqwest::Client,
    source: TokenSource,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    /// Builds a provider from the environment.
    ///
    /// Uses `GOOGLE_ACCESS_TOKEN` when set, otherwise the metadata server at
    /// `GCE_METADATA_HOST` (default `metadata.google.internal`).
    ///
    /// # Errors
    /// Returns [`AuthError::Transport`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, AuthError> {
        match env_opt("GOOGLE_ACCESS_TOKEN") {
            Some(token) => {
                info!("using static GOOGLE_ACCESS_TOKEN");
                Self::with_static(token)
            }
            None => {
                let host = env_opt("GCE_METADATA_HOST")
                    .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string());
                info!(%host, "using metadata server for access tokens");
                Self::with_metadata_host(&host)
            }
        }
    }

    /// Provider that always returns `token`.
    pub fn with_static(token: impl Into<String>) -> Result<Self, AuthError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()?,
            source: TokenSource::Static(token.into()),
            cache: RwLock::new(None),
        })
    }

    /// Provider backed by the metadata server at `host` (no scheme).
    pub fn with_metadata_host(host: &str) -> Result<Self, AuthError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()?,
            source: TokenSource::Metadata {
                url: format!("http://{}{TOKEN_PATH}", host.trim_end_matches('/')),
            },
            cache: RwLock::new(None),
        })
    }

    /// Returns a bearer token valid for at least [`REFRESH_MARGIN`].
    ///
    /// # Errors
    /// Returns [`AuthError`] if the metadata server is unreachable or answers
    /// with an unexpected payload.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let url = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Metadata { url } => url,
        };

        if let Some(cached) = self.cache.read().await.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.value.clone());
            }
        }

        let mut slot = self.cache.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.value.clone());
            }
        }

        debug!(%url, "fetching access token");
        let resp = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::HttpStatus {
                status,
                snippet: body.chars().take(200).collect(),
            });
        }

        let token: MetadataToken = resp
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;

        let cached = CachedToken {
            value: token.access_token,
            refresh_at: refresh_deadline(Instant::now(), token.expires_in),
        };
        *slot = Some(cached.clone());
        Ok(cached.value)
    }
}

fn refresh_deadline(now: Instant, expires_in_secs: u64) -> Instant {
    let lifetime = Duration::from_secs(expires_in_secs);
    now + lifetime.saturating_sub(REFRESH_MARGIN)
}
