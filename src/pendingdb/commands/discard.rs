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
        result.add_message(CmdMessage::info("Nothing to discard."));
        return Ok(result);
    }

    manager.discard_pending_transaction(&descriptor)?;
    result.add_message(CmdMessage::warning(format!(
        "Pending transaction for {} discarded",
        descriptor
    )));
    Ok(result)
}
