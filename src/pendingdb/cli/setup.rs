use clap::{Parser, Subcommand};
use pendingdb::error::{PendingError, Result};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "pendingdb", bin_name = "pendingdb", version)]
#[command(about = "Queue, inspect and replay pending password database edits", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty database file
    Init {
        /// Path of the database file
        database: PathBuf,

        /// Name of the root group
        #[arg(long, default_value = "Database")]
        name: String,
    },

    /// Show whether a database has pending operations
    #[command(alias = "st")]
    Status {
        /// Path of the database file
        database: PathBuf,
    },

    /// List pending operations
    #[command(alias = "ls")]
    Show {
        /// Path of the database file
        database: PathBuf,
    },

    /// Queue a new entry
    #[command(alias = "n")]
    Create {
        /// Path of the database file
        database: PathBuf,

        /// Parent group UUID (defaults to the root group)
        #[arg(long)]
        parent: Option<Uuid>,

        /// UUID for the new entry (random if omitted)
        #[arg(long)]
        uuid: Option<Uuid>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        url: Option<String>,

        /// Apply immediately and save the database file
        #[arg(long)]
        apply: bool,
    },

    /// Queue field changes for an entry
    #[command(alias = "e")]
    Edit {
        /// Path of the database file
        database: PathBuf,

        /// Entry UUID
        entry: Uuid,

        /// Field to set (NAME=VALUE), repeatable
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// Protected field to set (NAME=VALUE), repeatable
        #[arg(long = "protect", value_parser = parse_assignment)]
        protect: Vec<(String, String)>,

        /// Apply immediately and save the database file
        #[arg(long)]
        apply: bool,
    },

    /// Queue an additional URL for an entry
    AddUrl {
        /// Path of the database file
        database: PathBuf,

        /// Entry UUID
        entry: Uuid,

        url: String,

        /// Apply immediately and save the database file
        #[arg(long)]
        apply: bool,
    },

    /// Replay pending operations into the database file
    Apply {
        /// Path of the database file
        database: PathBuf,
    },

    /// Drop the pending transaction without applying it
    Discard {
        /// Path of the database file
        database: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

/// Parses `NAME=VALUE`. The value may be empty and may contain `=`.
pub fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", s))?;
    if name.trim().is_empty() {
        return Err(format!("missing field name in `{}`", s));
    }
    Ok((name.trim().to_string(), value.to_string()))
}

/// Installs the stderr tracing subscriber. `RUST_LOG` overrides the default level.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| PendingError::Store(format!("Failed to initialize logging: {}", e)))
}
