//! Object storage for exported embedding files.
//!
//! - [`config`]       - bucket and endpoint from env
//! - [`gcs_uploader`] - Cloud Storage JSON API media upload, implementing
//!   [`bill_core::ObjectStoreUploader`]
//! - [`errors`]       - [`StorageError`]

pub mod config;
pub mod errors;
pub mod gcs_uploader;

pub use config::StorageConfig;
pub use errors::StorageError;
pub use gcs_uploader::GcsUploader;
