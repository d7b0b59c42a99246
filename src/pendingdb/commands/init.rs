use crate::commands::{CmdMessage, CmdResult};
use crate::database_file::DatabaseFile;
use crate::descriptor::FileReference;
use crate::error::Result;

pub fn run(reference: FileReference, name: &str) -> Result<CmdResult> {
    let file = DatabaseFile::create(reference, name)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Database created: {} (root group {})",
        file.reference().location().display(),
        file.database.root.uuid
    )));
    Ok(result)
}
