use crate::commands::CmdResult;
use crate::config::PendingConfig;
use crate::error::Result;
use std::path::Path;

pub fn run(data_dir: &Path) -> Result<CmdResult> {
    let config = PendingConfig::load(data_dir)?;
    Ok(CmdResult::default().with_config(config))
}
