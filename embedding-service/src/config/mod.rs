pub mod default_config;
pub mod embedding_model_config;
pub mod embedding_provider;
