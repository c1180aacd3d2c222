//! Shared helpers used by every crate in the workspace:
//! environment-driven configuration and Google Cloud access tokens.

pub mod env;
pub mod gcp_auth;
