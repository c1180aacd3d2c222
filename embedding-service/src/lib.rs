//! Text embedding clients for the bill pipeline.
//!
//! - [`config`]           - provider selection and model settings from env
//! - [`services`]         - one thin REST client per provider
//! - [`embedding_client`] - provider dispatch + the pipeline's `EmbeddingModel` seam
//! - [`error_handler`]    - unified [`EmbeddingError`]

pub mod config;
pub mod embedding_client;
pub mod error_handler;
pub mod services;

pub use config::{
    default_config::config_from_env, embedding_model_config::EmbeddingModelConfig,
    embedding_provider::EmbeddingProvider,
};
pub use embedding_client::EmbeddingClient;
pub use error_handler::EmbeddingError;
