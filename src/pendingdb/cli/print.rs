use chrono::{DateTime, Utc};
use colored::Colorize;
use pendingdb::commands::{CmdMessage, MessageLevel};
use pendingdb::config::PendingConfig;
use pendingdb::operation::DatabaseOperation;
use std::path::Path;
use timeago::Formatter;

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

pub(super) fn print_operations(operations: &[DatabaseOperation]) {
    for (i, op) in operations.iter().enumerate() {
        println!(
            "{:>3}. {:<12} {}  {}",
            i,
            op.kind().to_string().yellow(),
            op.entry_uuid(),
            format_time_ago(op.timestamp()).dimmed()
        );
        for detail in describe(op) {
            println!("       {}", detail);
        }
    }
}

pub(super) fn print_config(config: &PendingConfig, data_dir: &Path) {
    println!("store-dir = {}", config.store_dir(data_dir).display());
    println!("recovery-group-title = {}", config.recovery_group_title);
    println!("provider = {}", config.provider);
}

fn describe(op: &DatabaseOperation) -> Vec<String> {
    match op {
        DatabaseOperation::CreateEntry(op) => vec![format!("in group {}", op.parent_uuid)],
        DatabaseOperation::EditEntry(op) => op
            .fields
            .iter()
            .map(|f| {
                if f.is_protected {
                    format!("{} = ********", f.name)
                } else {
                    format!("{} = {}", f.name, f.value)
                }
            })
            .collect(),
        DatabaseOperation::AddEntryUrl(op) => vec![format!("url {}", op.url)],
    }
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    Formatter::new().convert(duration.to_std().unwrap_or_default())
}
