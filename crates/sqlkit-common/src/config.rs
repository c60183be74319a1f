//! Configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! database and pagination sections. Every section defaults sensibly so a
//! completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load configuration from a file that must exist and parse.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;
        self.pagination.validate()
    }
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// Connection and migration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Run `PRAGMA foreign_keys = ON` on every new connection.
    pub foreign_keys: bool,
    /// Use WAL journal mode for on-disk databases.
    pub wal: bool,
    /// Directory holding `<version>_<slug>.up.sql` migration files.
    pub migrations_dir: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sqlkit.db"),
            max_connections: 4,
            foreign_keys: true,
            wal: true,
            migrations_dir: None,
        }
    }
}

impl DatabaseConfig {
    fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(Error::validation("database.max_connections must be at least 1"));
        }
        if self.path.as_os_str().is_empty() {
            return Err(Error::validation("database.path must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Defaults applied to incoming pagination requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the caller does not ask for one.
    pub per_page: u64,
    /// Upper bound for caller-supplied page sizes.
    pub max_per_page: u64,
    pub left_edge: u64,
    pub left_current: u64,
    pub right_current: u64,
    pub right_edge: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            per_page: 10,
            max_per_page: 100,
            left_edge: 2,
            left_current: 2,
            right_current: 4,
            right_edge: 2,
        }
    }
}

impl PaginationConfig {
    /// Resolve a caller-supplied page size against the configured bounds.
    pub fn clamp_per_page(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.per_page)
            .clamp(1, self.max_per_page.max(1))
    }

    fn validate(&self) -> Result<()> {
        if self.per_page == 0 {
            return Err(Error::validation("pagination.per_page must be at least 1"));
        }
        if self.max_per_page < self.per_page {
            return Err(Error::validation(
                "pagination.max_per_page must not be smaller than pagination.per_page",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_json_is_default() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.pagination.per_page, 10);
        assert_eq!(config.pagination.right_current, 4);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config =
            Config::from_json(r#"{"database": {"path": "/tmp/app.db"}, "pagination": {"per_page": 25}}"#)
                .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/app.db"));
        assert!(config.database.foreign_keys);
        assert_eq!(config.pagination.per_page, 25);
        assert_eq!(config.pagination.max_per_page, 100);
    }

    #[test]
    fn invalid_json_is_validation_error() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn validate_rejects_zero_pool() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_page_bounds() {
        let mut config = Config::default();
        config.pagination.per_page = 50;
        config.pagination.max_per_page = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn clamp_per_page() {
        let cfg = PaginationConfig::default();
        assert_eq!(cfg.clamp_per_page(None), 10);
        assert_eq!(cfg.clamp_per_page(Some(0)), 1);
        assert_eq!(cfg.clamp_per_page(Some(30)), 30);
        assert_eq!(cfg.clamp_per_page(Some(5000)), 100);
    }

    #[test]
    fn load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(Some(&dir.path().join("missing.json")));
        assert_eq!(config, Config::default());
        assert_eq!(Config::load_or_default(None), Config::default());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlkit.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"database": {{"max_connections": 8}}}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database.max_connections, 8);
    }
}
