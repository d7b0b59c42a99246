//! # Command Layer
//!
//! Business logic behind each CLI subcommand. Commands take Rust values, return a
//! [`CmdResult`] and never touch stdout/stderr; the CLI decides how to print.

use crate::config::PendingConfig;
use crate::operation::DatabaseOperation;

pub mod apply;
pub mod config;
pub mod discard;
pub mod init;
pub mod queue;
pub mod show;
pub mod status;

#[derive(Debug, Clone)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub listed_operations: Vec<DatabaseOperation>,
    pub pending_count: Option<usize>,
    pub config: Option<PendingConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_listed_operations(mut self, operations: Vec<DatabaseOperation>) -> Self {
        self.listed_operations = operations;
        self
    }

    pub fn with_pending_count(mut self, count: usize) -> Self {
        self.pending_count = Some(count);
        self
    }

    pub fn with_config(mut self, config: PendingConfig) -> Self {
        self.config = Some(config);
        self
    }
}
