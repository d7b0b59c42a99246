//! # CLI Layer
//!
//! The only place that knows about terminal I/O and process exit codes. Each handler
//! builds inputs, calls into `pendingdb::commands` and prints the `CmdResult`.
//!
//! ## Locations
//!
//! - data dir: `$PENDINGDB_HOME`, else the platform data dir for `pendingdb`
//! - config: `<data dir>/config.json`
//! - pending records: `PendingConfig::store_dir` (default `<data dir>/pending`)

use super::print::{print_config, print_messages, print_operations};
use super::setup::{init_tracing, Cli, Commands};
use clap::Parser;
use directories::ProjectDirs;
use pendingdb::commands::{self, queue::NewEntry, CmdResult};
use pendingdb::config::PendingConfig;
use pendingdb::descriptor::FileReference;
use pendingdb::error::{PendingError, Result};
use pendingdb::manager::DatabaseTransactionManager;
use pendingdb::operation::FieldChange;
use pendingdb::quicktype::NullQuickTypeIndex;
use pendingdb::store::fs::DirStore;
use std::path::PathBuf;

const HOME_ENV: &str = "PENDINGDB_HOME";

struct AppContext {
    manager: DatabaseTransactionManager<DirStore>,
    config: PendingConfig,
    data_dir: PathBuf,
}

impl AppContext {
    fn reference(&self, database: PathBuf) -> FileReference {
        FileReference::new(database).with_provider(self.config.provider.clone())
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let ctx = init_context()?;
    let mut index = NullQuickTypeIndex;

    match cli.command {
        Commands::Init { database, name } => {
            report(commands::init::run(ctx.reference(database), &name)?)
        }
        Commands::Status { database } => {
            report(commands::status::run(&ctx.manager, &ctx.reference(database))?)
        }
        Commands::Show { database } => {
            let result = commands::show::run(&ctx.manager, &ctx.reference(database))?;
            print_operations(&result.listed_operations);
            report(result)
        }
        Commands::Create {
            database,
            parent,
            uuid,
            title,
            username,
            password,
            url,
            apply,
        } => {
            let new_entry = NewEntry {
                uuid,
                parent,
                title,
                user_name: username,
                password,
                url,
            };
            let reference = ctx.reference(database);
            report(commands::queue::create(
                &ctx.manager,
                reference,
                new_entry,
                apply,
                &mut index,
            )?)
        }
        Commands::Edit {
            database,
            entry,
            set,
            protect,
            apply,
        } => {
            let changes = field_changes(set, protect);
            let reference = ctx.reference(database);
            report(commands::queue::edit(
                &ctx.manager,
                reference,
                entry,
                changes,
                apply,
                &mut index,
            )?)
        }
        Commands::AddUrl {
            database,
            entry,
            url,
            apply,
        } => {
            let reference = ctx.reference(database);
            report(commands::queue::add_url(
                &ctx.manager,
                reference,
                entry,
                url,
                apply,
                &mut index,
            )?)
        }
        Commands::Apply { database } => {
            let reference = ctx.reference(database);
            report(commands::apply::run(&ctx.manager, reference, &mut index)?)
        }
        Commands::Discard { database } => {
            report(commands::discard::run(&ctx.manager, &ctx.reference(database))?)
        }
        Commands::Config => {
            let result = commands::config::run(&ctx.data_dir)?;
            if let Some(config) = &result.config {
                print_config(config, &ctx.data_dir);
            }
            report(result)
        }
    }
}

fn init_context() -> Result<AppContext> {
    let data_dir = data_dir()?;
    let config = PendingConfig::load(&data_dir)?;
    let store = DirStore::new(config.store_dir(&data_dir));
    let manager = DatabaseTransactionManager::new(store)
        .with_recovery_title(config.recovery_group_title.clone());

    Ok(AppContext {
        manager,
        config,
        data_dir,
    })
}

fn data_dir() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "pendingdb", "pendingdb")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| PendingError::Store("Could not determine data directory".to_string()))
}

fn field_changes(set: Vec<(String, String)>, protect: Vec<(String, String)>) -> Vec<FieldChange> {
    let plain = set.into_iter().map(|(name, value)| (name, value, false));
    let protected = protect.into_iter().map(|(name, value)| (name, value, true));
    plain
        .chain(protected)
        .map(|(name, value, is_protected)| FieldChange {
            name,
            value,
            is_protected,
        })
        .collect()
}

fn report(result: CmdResult) -> Result<()> {
    print_messages(&result.messages);
    Ok(())
}
