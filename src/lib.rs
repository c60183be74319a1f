//! Sqlkit - pagination, models, and migrations over SQLite
//!
//! This library crate re-exports the workspace crates under one roof.

pub use sqlkit_common as common;
pub use sqlkit_db as db;
pub use sqlkit_paginate as paginate;

pub use sqlkit_common::{Config, Error, Result};
pub use sqlkit_db::{Migration, Migrator, Model, Query, Scope};
pub use sqlkit_paginate::{paginate, PageLink, PageRequest, Paginator};
