//! Storage settings from the environment.
//!
//! - `BUCKET_NAME`  (mandatory)
//! - `GCS_ENDPOINT` (default `https://storage.googleapis.com`; point it at an
//!   emulator such as fake-gcs-server for local runs)
//! - `GCS_TIMEOUT_SECS` (default 60)

use services::env::{ConfigError, env_opt, parse_var};

const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env_opt(name))
    }

    /// Same as [`StorageConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let bucket = lookup("BUCKET_NAME").ok_or(ConfigError::MissingVar("BUCKET_NAME"))?;
        validate_bucket(&bucket)?;

        let endpoint = lookup("GCS_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                var: "GCS_ENDPOINT",
                reason: "must start with http:// or https://".into(),
            });
        }

        let timeout_secs = parse_var::<u64>("GCS_TIMEOUT_SECS", lookup("GCS_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            bucket,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }
}

/// Bucket names go into the request path unescaped, so only the characters
/// Cloud Storage itself allows are accepted.
fn validate_bucket(bucket: &str) -> Result<(), ConfigError> {
    let len_ok = (3..=222).contains(&bucket.len());
    let chars_ok = bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    let edges_ok = bucket
        .chars()
        .next()
        .zip(bucket.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());

    if len_ok && chars_ok && edges_ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            var: "BUCKET_NAME",
            reason: format!("`{bucket}` is not a valid bucket name"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from(vars: &[(&'static str, &'static str)]) -> Result<StorageConfig, ConfigError> {
        let vars: HashMap<_, _> = vars.iter().copied().collect();
        StorageConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_to_public_endpoint() {
        let cfg = from(&[("BUCKET_NAME", "civic-embeddings")]).unwrap();
        assert_eq!(cfg.bucket, "civic-embeddings");
        assert_eq!(cfg.endpoint, "https://storage.googleapis.com");
        assert_eq!(cfg.timeout_secs, 60);
    }

    #[test]
    fn bucket_is_required() {
        assert!(matches!(from(&[]), Err(ConfigError::MissingVar("BUCKET_NAME"))));
    }

    #[test]
    fn rejects_bucket_names_that_would_alter_the_path() {
        for bad in ["Upper", "a/b", "-lead", "ab", "trail."] {
            assert!(from(&[("BUCKET_NAME", bad)]).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn emulator_endpoint_is_trimmed() {
        let cfg = from(&[
            ("BUCKET_NAME", "local.bucket"),
            ("GCS_ENDPOINT", "http://localhost:4443/"),
        ])
        .unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:4443");
    }

    #[test]
    fn timeout_must_be_a_number() {
        let err = from(&[("BUCKET_NAME", "civic-embeddings"), ("GCS_TIMEOUT_SECS", "soon")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "GCS_TIMEOUT_SECS", .. }));
    }
}
