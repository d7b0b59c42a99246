use crate::error::{PendingError, Result};
use crate::transaction::DEFAULT_RECOVERY_GROUP_TITLE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_STORE_DIRNAME: &str = "pending";
const DEFAULT_PROVIDER: &str = "local";

/// Configuration for pendingdb, stored in `<data dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct PendingConfig {
    /// Directory holding pending transaction records (defaults to `<data dir>/pending`)
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Title prefix of the group that receives recovered entries
    #[serde(default = "default_recovery_group_title")]
    pub recovery_group_title: String,

    /// Storage provider tag used when building descriptors
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_recovery_group_title() -> String {
    DEFAULT_RECOVERY_GROUP_TITLE.to_string()
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            store_dir: None,
            recovery_group_title: default_recovery_group_title(),
            provider: default_provider(),
        }
    }
}

impl PendingConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(PendingError::Io)?;
        let config: PendingConfig =
            serde_json::from_str(&content).map_err(PendingError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(PendingError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(PendingError::Serialization)?;
        fs::write(config_path, content).map_err(PendingError::Io)?;
        Ok(())
    }

    /// Effective store directory, relative to `data_dir` when not configured.
    pub fn store_dir(&self, data_dir: &Path) -> PathBuf {
        match &self.store_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => data_dir.join(dir),
            None => data_dir.join(DEFAULT_STORE_DIRNAME),
        }
    }
}
