//! Database connection helpers.
//!
//! The SQLite pool behind [`DieselRepository`](crate::repository::DieselRepository).
//! Lock waits, journaling and read-only mode are per-connection pragmas, so
//! [`ConnectionOptions`] runs them on every connection the pool opens.

use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError, PooledConnection};
use diesel::sqlite::SqliteConnection;
use log::{debug, error};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Pragmas applied to each pooled connection, plus the pool size.
pub struct ConnectionOptions {
    /// Enable Write Ahead Logging mode for SQLite.
    pub enable_wal: bool,
    /// Enforce foreign key checks for SQLite.
    pub enable_foreign_keys: bool,
    /// Timeout to wait for a locked database.
    pub busy_timeout: Option<Duration>,
    /// Reject writes on the connection (`PRAGMA query_only`).
    pub read_only: bool,
    /// Upper bound on pooled connections; r2d2's default when unset.
    pub max_connections: Option<u32>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            enable_wal: true,
            enable_foreign_keys: true,
            busy_timeout: Some(Duration::from_secs(30)),
            read_only: false,
            max_connections: None,
        }
    }
}

impl ConnectionOptions {
    /// The pragma batch run on each new connection. `query_only` goes last
    /// so the journal mode switch is still allowed.
    pub fn pragmas(&self) -> String {
        let mut pragmas = Vec::new();
        if self.enable_wal {
            pragmas.push("PRAGMA journal_mode = WAL;".to_owned());
            pragmas.push("PRAGMA synchronous = NORMAL;".to_owned());
        }
        if self.enable_foreign_keys {
            pragmas.push("PRAGMA foreign_keys = ON;".to_owned());
        }
        if let Some(timeout) = self.busy_timeout {
            pragmas.push(format!("PRAGMA busy_timeout = {};", timeout.as_millis()));
        }
        if self.read_only {
            pragmas.push("PRAGMA query_only = ON;".to_owned());
        }
        pragmas.join(" ")
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let pragmas = self.pragmas();
        if pragmas.is_empty() {
            return Ok(());
        }
        conn.batch_execute(&pragmas).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Create a Diesel connection pool for the given database URL.
pub fn establish_connection_pool(database_url: &str) -> Result<DbPool, PoolError> {
    establish_connection_pool_with(database_url, ConnectionOptions::default())
}

/// Create a Diesel connection pool applying `options` to every connection.
pub fn establish_connection_pool_with(
    database_url: &str,
    options: ConnectionOptions,
) -> Result<DbPool, PoolError> {
    debug!("Opening pool for {database_url} with {options:?}");
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let mut builder = Pool::builder();
    if let Some(max) = options.max_connections {
        builder = builder.max_size(max);
    }
    builder.connection_customizer(Box::new(options)).build(manager)
}

/// Retrieve a connection from the pool
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, PoolError> {
    pool.get().inspect_err(|e| {
        error!("Failed to get connection from pool: {e}");
    })
}

/// Retrieve a connection, giving up after `timeout` instead of the pool's
/// own connection timeout.
pub fn get_connection_timeout(
    pool: &DbPool,
    timeout: Duration,
) -> Result<DbConnection, PoolError> {
    pool.get_timeout(timeout).inspect_err(|e| {
        error!("Failed to get connection from pool within {timeout:?}: {e}");
    })
}
