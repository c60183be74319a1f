//! Database connection pool management.
//!
//! Connections are handed out explicitly: callers acquire a
//! [`PooledConnection`] with [`get_conn`] and pass `&Connection` down to the
//! model and query helpers. The connection goes back to the pool when the
//! handle is dropped.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use sqlkit_common::{DatabaseConfig, Error, Result};

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Initialize a database pool from configuration.
///
/// This function will:
/// - Create the SQLite database file if it doesn't exist
/// - Enable foreign key constraints and WAL mode on every new connection
///   when configured
/// - Size the pool to `max_connections`
///
/// Migrations are not run here; see [`crate::migrations::Migrator`].
///
/// # Example
///
/// ```no_run
/// use sqlkit_common::DatabaseConfig;
/// use sqlkit_db::pool::{get_conn, init_pool};
///
/// let pool = init_pool(&DatabaseConfig::default()).unwrap();
/// let conn = get_conn(&pool).unwrap();
/// ```
pub fn init_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let pragmas = connection_pragmas(config.foreign_keys, config.wal);
    let manager =
        SqliteConnectionManager::file(&config.path).with_init(move |conn| conn.execute_batch(&pragmas));

    let pool = Pool::builder()
        .max_size(config.max_connections.max(1))
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {e}")))?;

    tracing::debug!(
        path = %config.path.display(),
        max_connections = config.max_connections,
        "opened connection pool"
    );
    Ok(pool)
}

/// Initialize an in-memory database pool (useful for tests).
///
/// Each call creates a uniquely-named shared-cache in-memory database so
/// that parallel tests do not interfere with each other, while all
/// connections *within* a single pool still share state.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!("file:sqlkit_memdb_{n}?mode=memory&cache=shared");

    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create in-memory pool: {e}")))
}

/// Convenience helper to get a connection from the pool.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {e}")))
}

fn connection_pragmas(foreign_keys: bool, wal: bool) -> String {
    let mut pragmas = String::new();
    if foreign_keys {
        pragmas.push_str("PRAGMA foreign_keys = ON;");
    }
    if wal {
        pragmas.push_str("PRAGMA journal_mode = WAL;");
    }
    pragmas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_memory_pool() {
        let pool = init_memory_pool().unwrap();
        assert_eq!(pool.max_size(), 4);
    }

    #[test]
    fn test_get_conn() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_memory_pool_connections_share_state() {
        let pool = init_memory_pool().unwrap();
        let a = get_conn(&pool).unwrap();
        a.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
            .unwrap();

        let b = get_conn(&pool).unwrap();
        let n: i64 = b.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_init_pool_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("app.db"),
            max_connections: 2,
            ..DatabaseConfig::default()
        };
        let pool = init_pool(&config).unwrap();
        assert_eq!(pool.max_size(), 2);

        let conn = get_conn(&pool).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert!(config.path.exists());
    }

    #[test]
    fn test_pragmas() {
        assert_eq!(connection_pragmas(false, false), "");
        assert_eq!(
            connection_pragmas(true, true),
            "PRAGMA foreign_keys = ON;PRAGMA journal_mode = WAL;"
        );
    }
}
