//! Pipeline settings loaded from the environment.
//!
//! # Environment variables
//! - `SINK_MODE`               - `export` (default) or `insert`
//! - `EMBEDDING_FAILURE_MODE`  - `lenient` (default) or `strict`
//! - `RATE_LIMIT_CALLS`        - calls per window (default 60)
//! - `RATE_LIMIT_PAUSE_SECS`   - pause after a full window (default 60)
//! - `EXPORT_PREFIX`           - object key folder (default `embeddings-folder`)
//! - `EXPORT_INCLUDE_RECORD`   - write record fields next to the vector (default false)

use std::{fmt, str::FromStr, time::Duration};

use services::env::{ConfigError, env_flag, env_opt, env_or, env_parse};

use crate::generator::{FailureMode, GeneratorOptions};
use crate::rate_limit::RateLimitPolicy;
use crate::sink::export::{DEFAULT_EXPORT_PREFIX, ExportOptions};

/// Which sink the run writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkMode {
    /// CSV file uploaded to object storage.
    #[default]
    Export,
    /// One row per record in the output table.
    Insert,
}

impl FromStr for SinkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "export" | "file" => Ok(Self::Export),
            "insert" | "database" | "db" => Ok(Self::Insert),
            other => Err(format!("unknown sink mode `{other}` (expected export|insert)")),
        }
    }
}

impl fmt::Display for SinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Export => "export",
            Self::Insert => "insert",
        })
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sink_mode: SinkMode,
    pub generator: GeneratorOptions,
    pub export: ExportOptions,
}

impl PipelineConfig {
    /// Reads the pipeline settings.
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] when a mode or number does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let sink_mode = parse_mode::<SinkMode>("SINK_MODE")?.unwrap_or_default();
        let failure_mode =
            parse_mode::<FailureMode>("EMBEDDING_FAILURE_MODE")?.unwrap_or_default();

        let defaults = RateLimitPolicy::default();
        let calls = env_parse::<u32>("RATE_LIMIT_CALLS")?.unwrap_or(defaults.calls_per_window());
        if calls == 0 {
            return Err(ConfigError::InvalidValue {
                var: "RATE_LIMIT_CALLS",
                reason: "must be at least 1".into(),
            });
        }
        let pause = env_parse::<u64>("RATE_LIMIT_PAUSE_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.pause());

        let export = ExportOptions {
            prefix: env_or("EXPORT_PREFIX", DEFAULT_EXPORT_PREFIX)
                .trim_matches('/')
                .to_string(),
            include_record: env_flag("EXPORT_INCLUDE_RECORD", false)?,
        };

        Ok(Self {
            sink_mode,
            generator: GeneratorOptions {
                failure_mode,
                rate_limit: RateLimitPolicy::new(calls, pause),
            },
            export,
        })
    }
}

fn parse_mode<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr<Err = String>,
{
    env_opt(var)
        .map(|raw| raw.parse::<T>())
        .transpose()
        .map_err(|reason| ConfigError::InvalidValue { var, reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_mode_aliases() {
        assert_eq!("Export".parse::<SinkMode>(), Ok(SinkMode::Export));
        assert_eq!("db".parse::<SinkMode>(), Ok(SinkMode::Insert));
        assert!("s3".parse::<SinkMode>().is_err());
        assert_eq!(SinkMode::Insert.to_string(), "insert");
    }
}
