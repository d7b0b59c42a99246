use crate::commands::{CmdMessage, CmdResult};
use crate::database_file::DatabaseFile;
use crate::descriptor::FileReference;
use crate::error::Result;
use crate::manager::DatabaseTransactionManager;
use crate::quicktype::QuickTypeIndex;
use crate::store::SecureStore;

/// Replays pending operations onto the database file, saves it and commits.
pub fn run<S: SecureStore>(
    manager: &DatabaseTransactionManager<S>,
    reference: FileReference,
    index: &mut dyn QuickTypeIndex,
) -> Result<CmdResult> {
    let mut file = DatabaseFile::load(reference)?;
    let outcome = manager.apply_unapplied_pending_operations(&mut file, index)?;

    let mut result = CmdResult::default();
    if outcome.applied == 0 {
        result.add_message(CmdMessage::info("No pending operations to apply."));
        return Ok(result.with_pending_count(0));
    }

    file.save()?;
    let committed = manager.commit_applied_operations(&mut file)?;
    result.add_message(CmdMessage::success(format!(
        "Applied {} pending operation(s)",
        committed
    )));

    if let Some(group) = outcome
        .recovery_group
        .and_then(|uuid| file.database.find_group(uuid))
    {
        result.add_message(CmdMessage::warning(format!(
            "Some targets were missing; {} item(s) placed in \"{}\"",
            group.entries.len() + group.groups.len(),
            group.name
        )));
    }

    let remaining = manager
        .get_pending_transaction(file.reference())?
        .map(|tx| tx.count())
        .unwrap_or(0);
    Ok(result.with_pending_count(remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::DatabaseFixture;
    use crate::model::FIELD_TITLE;
    use crate::operation::EditEntryOperation;
    use crate::quicktype::NullQuickTypeIndex;
    use crate::store::memory::MemoryStore;
    use crate::transaction::PendingTransaction;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn applies_saves_and_reports_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let reference = FileReference::new(dir.path().join("vault.json"));
        DatabaseFile::new(reference.clone(), DatabaseFixture::new().database)
            .save()
            .unwrap();

        let manager = DatabaseTransactionManager::new(MemoryStore::new());
        let orphan = Uuid::new_v4();
        manager
            .update_pending_transaction(&reference.descriptor().unwrap(), |_| {
                Some(PendingTransaction::from_operations(vec![
                    EditEntryOperation::new(orphan, Utc::now())
                        .with_field(FIELD_TITLE, "Orphan", false)
                        .into(),
                ]))
            })
            .unwrap();

        let result = run(&manager, reference.clone(), &mut NullQuickTypeIndex).unwrap();

        assert_eq!(result.pending_count, Some(0));
        assert_eq!(result.messages.len(), 2);
        let saved = DatabaseFile::load(reference).unwrap();
        assert_eq!(saved.database.find_entry(orphan).unwrap().title(), "Orphan");
    }

    #[test]
    fn nothing_pending_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let reference = FileReference::new(dir.path().join("vault.json"));
        let fixture = DatabaseFixture::new().with_entry("Bank", "");
        DatabaseFile::new(reference.clone(), fixture.database.clone())
            .save()
            .unwrap();

        let manager = DatabaseTransactionManager::new(MemoryStore::new());
        let result = run(&manager, reference.clone(), &mut NullQuickTypeIndex).unwrap();

        assert_eq!(result.pending_count, Some(0));
        assert_eq!(DatabaseFile::load(reference).unwrap().database, fixture.database);
    }
}
