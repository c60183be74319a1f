//! Savepoint-backed transactional scopes.
//!
//! A [`Scope`] is rolled back unless [`Scope::commit`] is called, including
//! when it is dropped during an early return or a panic. Scopes nest: a scope
//! opened inside another one only commits into its parent.

use std::sync::atomic::{AtomicU64, Ordering};

use rusqlite::Connection;
use sqlkit_common::Result;

static SAVEPOINT_SEQ: AtomicU64 = AtomicU64::new(0);

/// An open savepoint on a connection.
#[derive(Debug)]
pub struct Scope<'c> {
    conn: &'c Connection,
    name: String,
    finished: bool,
}

impl<'c> Scope<'c> {
    /// Open a savepoint on `conn`.
    pub fn begin(conn: &'c Connection) -> Result<Self> {
        let n = SAVEPOINT_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = format!("sqlkit_sp_{n}");
        conn.execute_batch(&format!("SAVEPOINT {name}"))?;
        Ok(Self {
            conn,
            name,
            finished: false,
        })
    }

    /// The connection this scope runs on.
    pub fn conn(&self) -> &'c Connection {
        self.conn
    }

    /// Make the scope's changes permanent (or part of the enclosing scope).
    pub fn commit(mut self) -> Result<()> {
        self.conn.execute_batch(&format!("RELEASE {}", self.name))?;
        self.finished = true;
        Ok(())
    }

    /// Discard the scope's changes.
    pub fn rollback(mut self) -> Result<()> {
        self.conn.execute_batch(&rollback_sql(&self.name))?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.execute_batch(&rollback_sql(&self.name)) {
            tracing::warn!(savepoint = %self.name, "Failed to roll back scope: {e}");
        }
    }
}

fn rollback_sql(name: &str) -> String {
    format!("ROLLBACK TO {name}; RELEASE {name}")
}

/// Run `f` inside a scope, committing if it returns `Ok` and rolling back
/// otherwise.
pub fn transaction<T, F>(conn: &Connection, f: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    let scope = Scope::begin(conn)?;
    let value = f(scope.conn())?;
    scope.commit()?;
    Ok(value)
}
