use super::SecureStore;
use crate::descriptor::Descriptor;
use crate::error::{PendingError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory-backed store: one file per descriptor.
///
/// Descriptors are arbitrary strings, so file names are derived from a v5 UUID of the
/// descriptor rather than the descriptor itself.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, key: &Descriptor) -> PathBuf {
        let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_str().as_bytes());
        self.root.join(format!("pending-{}.json", id))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(PendingError::Io)?;
        }
        Ok(())
    }
}

impl SecureStore for DirStore {
    fn get(&self, key: &Descriptor) -> Result<Option<Vec<u8>>> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(path).map_err(PendingError::Io)?;
        Ok(Some(data))
    }

    fn set(&self, key: &Descriptor, data: &[u8]) -> Result<()> {
        self.ensure_dir()?;

        // Atomic write
        let tmp_path = self.root.join(format!(".pending-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, data).map_err(PendingError::Io)?;
        fs::rename(&tmp_path, self.record_path(key)).map_err(PendingError::Io)?;
        Ok(())
    }

    fn erase(&self, key: &Descriptor) -> Result<()> {
        let path = self.record_path(key);
        if path.exists() {
            fs::remove_file(path).map_err(PendingError::Io)?;
        }
        Ok(())
    }
}
