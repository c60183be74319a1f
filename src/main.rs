mod cli;

use sqlkit::common::Config;
use sqlkit::db::{get_conn, init_pool, write_revision, Migrator};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, MigrateAction};
use std::path::{Path, PathBuf};

/// Settings resolved from the config file and command-line overrides.
struct Settings {
    config: Config,
    migrations_dir: PathBuf,
}

impl Settings {
    fn resolve(cli: &Cli) -> Self {
        let mut config = Config::load_or_default(cli.config.as_deref());
        if let Some(ref path) = cli.database {
            config.database.path = path.clone();
        }
        let migrations_dir = cli
            .migrations
            .clone()
            .or_else(|| config.database.migrations_dir.clone())
            .unwrap_or_else(|| PathBuf::from("migrations"));
        Self {
            config,
            migrations_dir,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "sqlkit=debug,sqlkit_db=debug,sqlkit_paginate=debug,sqlkit_common=debug".to_string()
        } else {
            "sqlkit=warn,sqlkit_db=warn,sqlkit_paginate=warn,sqlkit_common=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Migrate { ref action } => {
            let settings = Settings::resolve(&cli);
            migrate(&settings, action)
        }
        Commands::ValidateConfig {
            config: ref config_path,
        } => {
            let path = config_path.as_deref().or(cli.config.as_deref());
            validate_config(path)
        }
        Commands::Version => {
            println!("sqlkit {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn migrate(settings: &Settings, action: &MigrateAction) -> Result<()> {
    // Revisions only touch the filesystem.
    if let MigrateAction::Revision { message } = action {
        let path = write_revision(&settings.migrations_dir, message)?;
        println!("Created {}", path.display());
        return Ok(());
    }

    let migrator = load_migrator(&settings.migrations_dir)?;
    let pool = init_pool(&settings.config.database).with_context(|| {
        format!(
            "opening database {}",
            settings.config.database.path.display()
        )
    })?;
    let conn = get_conn(&pool)?;

    match *action {
        MigrateAction::Upgrade { to } => {
            let applied = migrator.upgrade(&conn, to)?;
            if applied.is_empty() {
                println!("Already up to date");
            } else {
                println!("Applied {} migration(s): {}", applied.len(), join(&applied));
            }
        }
        MigrateAction::Downgrade { to } => {
            let target = match to {
                Some(v) => v,
                None => {
                    // one step: keep everything below the newest applied version
                    let history = migrator.history(&conn)?;
                    if history.is_empty() {
                        println!("Nothing to downgrade");
                        return Ok(());
                    }
                    history
                        .iter()
                        .rev()
                        .nth(1)
                        .map(|a| a.version)
                        .unwrap_or(0)
                }
            };
            let reverted = migrator.downgrade(&conn, target)?;
            if reverted.is_empty() {
                println!("Nothing to downgrade");
            } else {
                println!(
                    "Reverted {} migration(s): {}",
                    reverted.len(),
                    join(&reverted)
                );
            }
        }
        MigrateAction::Current => match migrator.current(&conn)? {
            Some(version) => println!("{version}"),
            None => println!("none"),
        },
        MigrateAction::History { json } => {
            let history = migrator.history(&conn)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else if history.is_empty() {
                println!("No migrations applied");
            } else {
                for applied in &history {
                    println!(
                        "{:04}  {:<30}  {}",
                        applied.version, applied.name, applied.applied_at
                    );
                }
            }
        }
        MigrateAction::Stamp { version } => {
            migrator.stamp(&conn, version)?;
            println!("Stamped database at version {version}");
        }
        MigrateAction::Revision { .. } => {}
    }

    Ok(())
}

fn load_migrator(dir: &Path) -> Result<Migrator> {
    if !dir.is_dir() {
        tracing::warn!("Migrations directory {} not found", dir.display());
        return Ok(Migrator::default());
    }
    Migrator::load_dir(dir).with_context(|| format!("loading migrations from {}", dir.display()))
}

fn join(versions: &[i64]) -> String {
    versions
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = Config::load(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Database: {}", config.database.path.display());
    println!("  Max connections: {}", config.database.max_connections);
    if let Some(ref dir) = config.database.migrations_dir {
        println!("  Migrations: {}", dir.display());
    }
    println!(
        "  Pagination: {} per page (max {})",
        config.pagination.per_page, config.pagination.max_per_page
    );

    Ok(())
}
