//! Postgres side of the bill embedding job.
//!
//! - [`config`] - connection, source layout and output table from env
//! - [`ident`]  - validated, quoted SQL identifiers
//! - [`pool`]   - lazily connecting `PgPool`
//! - [`source`] - [`PgBillSource`], the [`bill_core::RowSource`] over the bills table
//! - [`sink`]   - [`PgBillSink`], the transactional [`bill_core::RelationalSink`]
//! - [`errors`] - [`StoreError`]

pub mod config;
pub mod errors;
pub mod ident;
pub mod pool;
pub mod sink;
pub mod source;

pub use config::{DbConnection, SourceLayout, SourceSettings, StoreConfig};
pub use errors::StoreError;
pub use ident::{QualifiedName, SqlIdent};
pub use pool::connect_lazy;
pub use sink::PgBillSink;
pub use source::PgBillSource;
