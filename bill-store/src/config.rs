//! Database settings from the environment.
//!
//! # Connection
//! - `DATABASE_URL` - full `postgres://` URL; when set, the parts below are ignored
//! - `DB_INSTANCE`  - Cloud SQL instance connection name, reached through the
//!   `/cloudsql/<instance>` unix socket
//! - `DB_HOST` / `DB_PORT` - TCP target when no instance is given
//!   (default `localhost` / `5432`)
//! - `DB_USER`, `DB_PASSWORD`, `DB_NAME` - mandatory without `DATABASE_URL`
//! - `DB_MAX_CONNECTIONS` - pool size (default 5)
//!
//! # Source table
//! - `SOURCE_TABLE`       - default `bills` (may be `schema.table`)
//! - `SOURCE_DATE_COLUMN` - compared against the threshold; `DB_TABLE` is
//!   accepted as a legacy alias (default `bills_inserted_date`)
//! - `SOURCE_LAYOUT`      - `columns` (default) or `serialized`
//! - `SOURCE_HEADLINE_COLUMN` / `SOURCE_STORY_COLUMN` / `SOURCE_SOCIAL_COLUMN`
//!   (default `headline` / `title` / `twitter`)
//! - `SOURCE_PAYLOAD_COLUMN` - JSON payload column (default `bill_data`)
//!
//! # Output table
//! - `DEST_TABLE` - required only when the insert sink is used

use std::{fmt, path::PathBuf, str::FromStr};

use services::env::{ConfigError, env_opt, parse_var};

use crate::ident::{QualifiedName, SqlIdent};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How to reach Postgres.
#[derive(Clone, PartialEq, Eq)]
pub enum DbConnection {
    Url(String),
    Socket {
        dir: PathBuf,
        user: String,
        password: String,
        database: String,
    },
    Tcp {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
}

// Credentials never reach the logs.
impl fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(_) => f.write_str("Url(<redacted>)"),
            Self::Socket { dir, user, database, .. } => f
                .debug_struct("Socket")
                .field("dir", dir)
                .field("user", user)
                .field("database", database)
                .finish_non_exhaustive(),
            Self::Tcp { host, port, user, database, .. } => f
                .debug_struct("Tcp")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("database", database)
                .finish_non_exhaustive(),
        }
    }
}

/// Shape of the rows in the source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLayout {
    /// One text column per field.
    Columns {
        headline: SqlIdent,
        story: SqlIdent,
        social_text: SqlIdent,
    },
    /// A single JSON payload column holding all fields.
    Serialized { payload: SqlIdent },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub table: QualifiedName,
    pub date_column: SqlIdent,
    pub layout: SourceLayout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub connection: DbConnection,
    pub max_connections: u32,
    pub source: SourceSettings,
    pub dest_table: Option<QualifiedName>,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env_opt(name))
    }

    /// Same as [`StoreConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let connection = connection(&lookup)?;

        let max_connections = parse_var::<u32>("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"))?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                var: "DB_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }

        let source_table = table(
            "SOURCE_TABLE",
            &lookup("SOURCE_TABLE").unwrap_or_else(|| "bills".into()),
        )?;

        let date_column = match lookup("SOURCE_DATE_COLUMN") {
            Some(col) => ident("SOURCE_DATE_COLUMN", &col)?,
            None => ident(
                "DB_TABLE",
                &lookup("DB_TABLE").unwrap_or_else(|| "bills_inserted_date".into()),
            )?,
        };

        let column = |var: &'static str, default: &str| -> Result<SqlIdent, ConfigError> {
            ident(var, &lookup(var).unwrap_or_else(|| default.to_string()))
        };

        let layout = match lookup("SOURCE_LAYOUT")
            .map(|raw| raw.parse::<LayoutKind>())
            .transpose()
            .map_err(|reason| ConfigError::InvalidValue {
                var: "SOURCE_LAYOUT",
                reason,
            })?
            .unwrap_or(LayoutKind::Columns)
        {
            LayoutKind::Columns => SourceLayout::Columns {
                headline: column("SOURCE_HEADLINE_COLUMN", "headline")?,
                story: column("SOURCE_STORY_COLUMN", "title")?,
                social_text: column("SOURCE_SOCIAL_COLUMN", "twitter")?,
            },
            LayoutKind::Serialized => SourceLayout::Serialized {
                payload: column("SOURCE_PAYLOAD_COLUMN", "bill_data")?,
            },
        };

        let dest_table = lookup("DEST_TABLE")
            .map(|raw| table("DEST_TABLE", &raw))
            .transpose()?;

        Ok(Self {
            connection,
            max_connections,
            source: SourceSettings {
                table: source_table,
                date_column,
                layout,
            },
            dest_table,
        })
    }
}

fn connection<F>(lookup: &F) -> Result<DbConnection, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(ConfigError::InvalidValue {
                var: "DATABASE_URL",
                reason: "must start with postgres:// or postgresql://".into(),
            });
        }
        return Ok(DbConnection::Url(url));
    }

    let required = |var: &'static str| lookup(var).ok_or(ConfigError::MissingVar(var));
    let user = required("DB_USER")?;
    let password = required("DB_PASSWORD")?;
    let database = required("DB_NAME")?;

    if let Some(instance) = lookup("DB_INSTANCE") {
        return Ok(DbConnection::Socket {
            dir: PathBuf::from("/cloudsql").join(instance),
            user,
            password,
            database,
        });
    }

    let port = parse_var::<u16>("DB_PORT", lookup("DB_PORT"))?.unwrap_or(5432);

    Ok(DbConnection::Tcp {
        host: lookup("DB_HOST").unwrap_or_else(|| "localhost".into()),
        port,
        user,
        password,
        database,
    })
}

fn ident(var: &'static str, raw: &str) -> Result<SqlIdent, ConfigError> {
    SqlIdent::new(raw).map_err(|e| ConfigError::InvalidValue {
        var,
        reason: e.to_string(),
    })
}

fn table(var: &'static str, raw: &str) -> Result<QualifiedName, ConfigError> {
    QualifiedName::parse(raw).map_err(|e| ConfigError::InvalidValue {
        var,
        reason: e.to_string(),
    })
}

enum LayoutKind {
    Columns,
    Serialized,
}

impl FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "columns" => Ok(Self::Columns),
            "serialized" | "json" => Ok(Self::Serialized),
            other => Err(format!(
                "unknown layout `{other}` (expected columns|serialized)"
            )),
        }
    }
}
