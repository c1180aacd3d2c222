//! Environment variable helpers.
//!
//! Every crate builds its configuration with these helpers so that a missing
//! or malformed value always surfaces as the same [`ConfigError`], which the
//! binary reports before the server starts listening.

use std::str::FromStr;

use thiserror::Error;

/// Configuration error raised while reading the process environment.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// Value is present but cannot be parsed into the expected type.
    #[error("invalid value in {var}: {reason}")]
    InvalidValue {
        /// Variable name (e.g., `RATE_LIMIT_CALLS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: String,
    },
}

/// Returns the trimmed value of `name`, or `None` if unset or blank.
pub fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Returns the value of `name`, falling back to `default` when unset or blank.
pub fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

/// Parses an optional value from env (`Ok(None)` if unset/blank).
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] if the variable is set but does not
/// parse as `T`.
pub fn env_parse<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_var(name, env_opt(name))
}

/// Parses a value already looked up for `name`. Loaders that read through a
/// lookup closure use this so their errors match [`env_parse`].
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] if `raw` does not parse as `T`.
pub fn parse_var<T>(name: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                var: name,
                reason: format!("`{raw}`: {e}"),
            }),
        None => Ok(None),
    }
}

/// Parses a boolean flag. Accepts `1/0`, `true/false`, `yes/no`, `on/off`.
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] for any other spelling.
pub fn env_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env_opt(name) {
        None => Ok(default),
        Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::InvalidValue {
            var: name,
            reason: format!("`{raw}` is not a boolean"),
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("on"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("No"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn missing_var_names_the_variable() {
        let err = env_opt("BILL_EMBEDDER_TEST_SURELY_UNSET")
            .ok_or(ConfigError::MissingVar("BILL_EMBEDDER_TEST_SURELY_UNSET"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required environment variable: BILL_EMBEDDER_TEST_SURELY_UNSET"
        );
    }

    #[test]
    fn unset_parse_is_none() {
        let v: Option<u32> = env_parse("BILL_EMBEDDER_TEST_SURELY_UNSET").unwrap();
        assert!(v.is_none());
        assert_eq!(env_or("BILL_EMBEDDER_TEST_SURELY_UNSET", "x"), "x");
    }

    #[test]
    fn parse_var_names_the_variable_and_value() {
        assert_eq!(parse_var::<u16>("DB_PORT", Some("5433".into())).unwrap(), Some(5433));
        assert_eq!(parse_var::<u16>("DB_PORT", None).unwrap(), None);

        let err = parse_var::<u16>("DB_PORT", Some("70000".into())).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("invalid value in DB_PORT: `70000`"), "{msg}");
    }
}
