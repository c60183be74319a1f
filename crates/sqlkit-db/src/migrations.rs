//! Versioned SQL migrations and runner.
//!
//! Migrations are either built in code or loaded from a directory of
//! `<version>_<slug>.up.sql` files with optional `.down.sql` companions. A
//! `schema_migrations` table tracks which versions have been applied. Each
//! step runs in its own [`Scope`], so a failing migration leaves the schema
//! at the previous version.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use sqlkit_common::{Error, Result};

use crate::scope::Scope;

const UP_SUFFIX: &str = ".up.sql";
const DOWN_SUFFIX: &str = ".down.sql";

/// One schema change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: i64,
    pub name: String,
    pub up: String,
    pub down: Option<String>,
}

impl Migration {
    pub fn new(version: i64, name: impl Into<String>, up: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            up: up.into(),
            down: None,
        }
    }

    pub fn with_down(mut self, down: impl Into<String>) -> Self {
        self.down = Some(down.into());
        self
    }
}

/// A row of `schema_migrations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub applied_at: String,
}

/// Applies and reverts an ordered set of migrations.
#[derive(Debug, Clone, Default)]
pub struct Migrator {
    migrations: Vec<Migration>,
}

impl Migrator {
    /// Sort `migrations` by version. Versions must be positive and unique.
    pub fn new(mut migrations: Vec<Migration>) -> Result<Self> {
        migrations.sort_by_key(|m| m.version);
        for pair in migrations.windows(2) {
            if pair[0].version == pair[1].version {
                return Err(Error::migration(pair[0].version, "duplicate migration version"));
            }
        }
        if let Some(m) = migrations.iter().find(|m| m.version <= 0) {
            return Err(Error::migration(m.version, "migration versions must be positive"));
        }
        Ok(Self { migrations })
    }

    /// Load every migration in `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut found: BTreeMap<i64, Migration> = BTreeMap::new();
        let mut downs: BTreeMap<i64, String> = BTreeMap::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(stem) = file_name.strip_suffix(UP_SUFFIX) {
                let (version, name) = parse_stem(stem)?;
                let up = fs::read_to_string(&path)?;
                if found.insert(version, Migration::new(version, name, up)).is_some() {
                    return Err(Error::migration(version, "duplicate migration version"));
                }
            } else if let Some(stem) = file_name.strip_suffix(DOWN_SUFFIX) {
                let (version, _) = parse_stem(stem)?;
                downs.insert(version, fs::read_to_string(&path)?);
            }
        }

        for (version, down) in downs {
            match found.get_mut(&version) {
                Some(m) => m.down = Some(down),
                None => {
                    return Err(Error::migration(version, "down migration without an up migration"))
                }
            }
        }

        tracing::debug!(dir = %dir.display(), count = found.len(), "loaded migrations");
        Self::new(found.into_values().collect())
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Highest known version, if any.
    pub fn head(&self) -> Option<i64> {
        self.migrations.last().map(|m| m.version)
    }

    fn find(&self, version: i64) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.version == version)
    }

    /// Create the tracking table if it does not exist.
    pub fn ensure_table(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version    INTEGER PRIMARY KEY,
                name       TEXT NOT NULL DEFAULT '',
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))
    }

    /// Applied migrations, oldest first.
    pub fn history(&self, conn: &Connection) -> Result<Vec<AppliedMigration>> {
        Self::ensure_table(conn)?;
        let mut stmt = conn.prepare(
            "SELECT version, name, applied_at FROM schema_migrations ORDER BY version",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AppliedMigration {
                    version: row.get(0)?,
                    name: row.get(1)?,
                    applied_at: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Highest applied version, `None` for a fresh database.
    pub fn current(&self, conn: &Connection) -> Result<Option<i64>> {
        Self::ensure_table(conn)?;
        let version = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get::<_, Option<i64>>(0)
            })?;
        Ok(version)
    }

    /// Known migrations that have not been applied.
    pub fn pending(&self, conn: &Connection) -> Result<Vec<&Migration>> {
        let applied: Vec<i64> = self.history(conn)?.iter().map(|a| a.version).collect();
        Ok(self
            .migrations
            .iter()
            .filter(|m| !applied.contains(&m.version))
            .collect())
    }

    /// Apply pending migrations up to and including `target` (all of them
    /// when `None`). Returns the versions applied, in order.
    pub fn upgrade(&self, conn: &Connection, target: Option<i64>) -> Result<Vec<i64>> {
        if let Some(target) = target {
            if self.find(target).is_none() {
                return Err(Error::migration(target, "unknown target version"));
            }
        }

        let mut applied = Vec::new();
        for m in self.pending(conn)? {
            if target.is_some_and(|t| m.version > t) {
                break;
            }
            let scope = Scope::begin(conn)?;
            scope
                .conn()
                .execute_batch(&m.up)
                .map_err(|e| Error::migration(m.version, format!("upgrade failed: {e}")))?;
            scope.conn().execute(
                "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                rusqlite::params![m.version, m.name],
            )?;
            scope.commit()?;
            tracing::info!(version = m.version, name = %m.name, "applied migration");
            applied.push(m.version);
        }
        Ok(applied)
    }

    /// Revert applied migrations newer than `target` (0 reverts everything).
    /// Returns the versions reverted, newest first.
    pub fn downgrade(&self, conn: &Connection, target: i64) -> Result<Vec<i64>> {
        let mut reverted = Vec::new();
        let history = self.history(conn)?;
        for applied in history.iter().rev().filter(|a| a.version > target) {
            let m = self.find(applied.version).ok_or_else(|| {
                Error::migration(applied.version, "applied migration is not known")
            })?;
            let down = m.down.as_deref().ok_or_else(|| {
                Error::migration(m.version, "migration has no down script")
            })?;

            let scope = Scope::begin(conn)?;
            scope
                .conn()
                .execute_batch(down)
                .map_err(|e| Error::migration(m.version, format!("downgrade failed: {e}")))?;
            scope
                .conn()
                .execute("DELETE FROM schema_migrations WHERE version = ?1", [m.version])?;
            scope.commit()?;
            tracing::info!(version = m.version, name = %m.name, "reverted migration");
            reverted.push(m.version);
        }
        Ok(reverted)
    }

    /// Record the database as being at `version` without running any SQL:
    /// every known migration up to `version` is marked applied and newer
    /// records are removed.
    pub fn stamp(&self, conn: &Connection, version: i64) -> Result<()> {
        if version != 0 && self.find(version).is_none() {
            return Err(Error::migration(version, "unknown stamp version"));
        }
        Self::ensure_table(conn)?;
        let scope = Scope::begin(conn)?;
        scope
            .conn()
            .execute("DELETE FROM schema_migrations WHERE version > ?1", [version])?;
        for m in self.migrations.iter().filter(|m| m.version <= version) {
            let exists = scope
                .conn()
                .query_row(
                    "SELECT 1 FROM schema_migrations WHERE version = ?1",
                    [m.version],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !exists {
                scope.conn().execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![m.version, m.name],
                )?;
            }
        }
        scope.commit()?;
        tracing::info!(version, "stamped migration version");
        Ok(())
    }
}

/// Split `0003_add_users` into `(3, "add_users")`.
fn parse_stem(stem: &str) -> Result<(i64, String)> {
    let (version, name) = stem.split_once('_').unwrap_or((stem, ""));
    let version: i64 = version.parse().map_err(|_| {
        Error::invalid_input(format!("migration file '{stem}' does not start with a version"))
    })?;
    Ok((version, name.to_string()))
}

/// Lowercase, underscore-separated form of a revision message.
pub fn slugify(message: &str) -> String {
    let mut slug = String::with_capacity(message.len());
    for c in message.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("revision");
    }
    slug
}

/// Create empty up/down files for the next version in `dir`. Returns the
/// path of the up file.
pub fn write_revision(dir: &Path, message: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let next = Migrator::load_dir(dir)?.head().unwrap_or(0) + 1;
    let stem = format!("{next:04}_{}", slugify(message));
    let mut header: String = message
        .split(['\n', '\r'])
        .filter(|line| !line.is_empty())
        .map(|line| format!("-- {line}\n"))
        .collect();
    header.push_str(&format!("-- created {}\n", Utc::now().to_rfc3339()));

    let up = dir.join(format!("{stem}{UP_SUFFIX}"));
    fs::write(&up, &header)?;
    fs::write(dir.join(format!("{stem}{DOWN_SUFFIX}")), &header)?;
    tracing::info!(path = %up.display(), "created revision");
    Ok(up)
}
