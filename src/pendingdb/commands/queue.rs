//! Queue new operations for a database file, optionally applying them right away.
//!
//! With `apply`, the operations are replayed onto the loaded tree, the database file is
//! saved and the applied prefix is committed, mirroring what the main app does after
//! the AutoFill extension queued work.

use crate::commands::{CmdMessage, CmdResult};
use crate::database_file::DatabaseFile;
use crate::descriptor::FileReference;
use crate::error::Result;
use crate::manager::DatabaseTransactionManager;
use crate::model::{FIELD_PASSWORD, FIELD_TITLE, FIELD_URL, FIELD_USERNAME};
use crate::operation::{
    AddEntryUrlOperation, CreateEntryOperation, DatabaseOperation, EditEntryOperation,
    FieldChange,
};
use crate::quicktype::QuickTypeIndex;
use crate::store::SecureStore;
use chrono::Utc;
use uuid::Uuid;

/// Fields for a new entry. Empty values are not queued.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub uuid: Option<Uuid>,
    pub parent: Option<Uuid>,
    pub title: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
}

pub fn create<S: SecureStore>(
    manager: &DatabaseTransactionManager<S>,
    reference: FileReference,
    new_entry: NewEntry,
    apply: bool,
    index: &mut dyn QuickTypeIndex,
) -> Result<CmdResult> {
    let mut file = DatabaseFile::load(reference)?;
    let now = Utc::now();
    let entry = new_entry.uuid.unwrap_or_else(Uuid::new_v4);
    let parent = new_entry.parent.unwrap_or(file.database.root.uuid);

    let mut edit = EditEntryOperation::new(entry, now);
    let fields = [
        (FIELD_TITLE, new_entry.title, false),
        (FIELD_USERNAME, new_entry.user_name, false),
        (FIELD_PASSWORD, new_entry.password, true),
        (FIELD_URL, new_entry.url, false),
    ];
    for (name, value, is_protected) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            edit = edit.with_field(name, value, is_protected);
        }
    }

    let mut operations: Vec<DatabaseOperation> =
        vec![CreateEntryOperation::new(entry, parent, now).into()];
    if !edit.fields.is_empty() {
        operations.push(edit.into());
    }

    let mut result = enqueue(manager, &mut file, operations, apply, index)?;
    result.add_message(CmdMessage::info(format!("Entry UUID: {}", entry)));
    Ok(result)
}

pub fn edit<S: SecureStore>(
    manager: &DatabaseTransactionManager<S>,
    reference: FileReference,
    entry: Uuid,
    changes: Vec<FieldChange>,
    apply: bool,
    index: &mut dyn QuickTypeIndex,
) -> Result<CmdResult> {
    let mut file = DatabaseFile::load(reference)?;
    if changes.is_empty() {
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::warning("No field changes given, nothing queued."));
        return Ok(result);
    }

    let op = changes.into_iter().fold(
        EditEntryOperation::new(entry, Utc::now()),
        |op, change| op.with_field(change.name, change.value, change.is_protected),
    );
    enqueue(manager, &mut file, vec![op.into()], apply, index)
}

pub fn add_url<S: SecureStore>(
    manager: &DatabaseTransactionManager<S>,
    reference: FileReference,
    entry: Uuid,
    url: String,
    apply: bool,
    index: &mut dyn QuickTypeIndex,
) -> Result<CmdResult> {
    let mut file = DatabaseFile::load(reference)?;
    let op = AddEntryUrlOperation::new(entry, Utc::now(), url);
    enqueue(manager, &mut file, vec![op.into()], apply, index)
}

fn enqueue<S: SecureStore>(
    manager: &DatabaseTransactionManager<S>,
    file: &mut DatabaseFile,
    operations: Vec<DatabaseOperation>,
    apply: bool,
    index: &mut dyn QuickTypeIndex,
) -> Result<CmdResult> {
    let queued = operations.len();
    manager.add_pending_operations(file, operations, apply, index)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Queued {} operation(s)",
        queued
    )));

    if apply {
        file.save()?;
        let committed = manager.commit_applied_operations(file)?;
        result.add_message(CmdMessage::success(format!(
            "Applied and saved {} operation(s)",
            committed
        )));
    }
    Ok(result)
}
