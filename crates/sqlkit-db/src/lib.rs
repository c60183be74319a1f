//! sqlkit-db: SQLite access layer.
//!
//! This crate provides connection pooling, savepoint scopes, versioned
//! migrations, a [`Model`] trait with CRUD helpers, and a [`Query`] builder
//! that plugs into `sqlkit-paginate` as a countable, sliceable source.

pub mod crud;
pub mod migrations;
pub mod model;
pub mod pool;
pub mod query;
pub mod scope;

#[cfg(test)]
mod test_fixtures;

pub use migrations::{write_revision, AppliedMigration, Migration, Migrator};
pub use model::Model;
pub use pool::{get_conn, init_memory_pool, init_pool, DbPool, PooledConnection};
pub use query::{Cmp, Order, Query};
pub use scope::{transaction, Scope};
