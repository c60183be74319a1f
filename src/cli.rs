use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sqlkit")]
#[command(author, version, about = "SQLite migration and schema tool")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides the config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Directory holding migration files (overrides the config)
    #[arg(short, long, global = true)]
    pub migrations: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage schema migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Config file to validate (uses --config if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum MigrateAction {
    /// Apply pending migrations
    Upgrade {
        /// Stop after this version
        #[arg(long)]
        to: Option<i64>,
    },

    /// Revert applied migrations (one step by default)
    Downgrade {
        /// Revert everything newer than this version (0 for all)
        #[arg(long)]
        to: Option<i64>,
    },

    /// Show the current schema version
    Current,

    /// List applied migrations
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark the database as being at a version without running SQL
    Stamp {
        /// Version to record
        version: i64,
    },

    /// Create empty up/down files for a new migration
    Revision {
        /// Short description used in the file name
        message: String,
    },
}
