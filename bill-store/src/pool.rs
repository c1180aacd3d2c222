use std::{str::FromStr, time::Duration};

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::info;

use crate::config::{DbConnection, StoreConfig};
use crate::errors::Result;

/// Builds the shared pool without opening a connection.
///
/// The first query checks a connection out, so the HTTP server can start even
/// while the database is still coming up; connection failures surface as
/// query errors on the request that hit them.
pub fn connect_lazy(cfg: &StoreConfig) -> Result<PgPool> {
    let options = connect_options(&cfg.connection)?;

    info!(
        max_connections = cfg.max_connections,
        connection = ?cfg.connection,
        "initializing Postgres pool"
    );

    Ok(PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy_with(options))
}

fn connect_options(conn: &DbConnection) -> Result<PgConnectOptions> {
    Ok(match conn {
        DbConnection::Url(url) => PgConnectOptions::from_str(url)?,
        DbConnection::Socket {
            dir,
            user,
            password,
            database,
        } => PgConnectOptions::new()
            .socket(dir)
            .username(user)
            .password(password)
            .database(database),
        DbConnection::Tcp {
            host,
            port,
            user,
            password,
            database,
        } => PgConnectOptions::new()
            .host(host)
            .port(*port)
            .username(user)
            .password(password)
            .database(database),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_options_carry_every_part() {
        let opts = connect_options(&DbConnection::Tcp {
            host: "db.internal".into(),
            port: 6432,
            user: "app".into(),
            password: "pw".into(),
            database: "civic".into(),
        })
        .unwrap();
        assert_eq!(opts.get_host(), "db.internal");
        assert_eq!(opts.get_port(), 6432);
        assert_eq!(opts.get_username(), "app");
        assert_eq!(opts.get_database(), Some("civic"));
    }

    #[test]
    fn malformed_url_is_an_error() {
        assert!(connect_options(&DbConnection::Url("not a url".into())).is_err());
    }
}
