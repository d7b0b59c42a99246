use crate::commands::{CmdMessage, CmdResult};
use crate::descriptor::FileReference;
use crate::error::Result;
use crate::manager::DatabaseTransactionManager;
use crate::store::SecureStore;

pub fn run<S: SecureStore>(
    manager: &DatabaseTransactionManager<S>,
    reference: &FileReference,
) -> Result<CmdResult> {
    let Some(tx) = manager.get_pending_transaction(reference)? else {
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::info("No pending operations."));
        return Ok(result.with_pending_count(0));
    };

    let count = tx.count();
    Ok(CmdResult::default()
        .with_listed_operations(tx.operations().to_vec())
        .with_pending_count(count))
}
