use crate::commands::{CmdMessage, CmdResult};
use crate::descriptor::FileReference;
use crate::error::Result;
use crate::manager::DatabaseTransactionManager;
use crate::store::SecureStore;

pub fn run<S: SecureStore>(
    manager: &DatabaseTransactionManager<S>,
    reference: &FileReference,
) -> Result<CmdResult> {
    let descriptor = reference.descriptor()?;
    let mut result = CmdResult::default();

    if !manager.has_pending_transaction(&descriptor) {
        result.add_message(CmdMessage::info(format!(
            "No pending transaction for {}",
            descriptor
        )));
        return Ok(result.with_pending_count(0));
    }

    let count = manager
        .get_pending_transaction(reference)?
        .map(|tx| tx.count())
        .unwrap_or(0);
    if count == 0 {
        result.add_message(CmdMessage::warning(format!(
            "Pending record for {} is unreadable and will be ignored",
            descriptor
        )));
    } else {
        result.add_message(CmdMessage::info(format!(
            "{} pending operation(s) for {}",
            count, descriptor
        )));
    }
    Ok(result.with_pending_count(count))
}
