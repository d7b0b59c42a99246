//! A loaded database together with its file reference and replay watermark.
//!
//! The watermark counts how many leading operations of the file's pending transaction
//! are already reflected in the in-memory tree but not yet confirmed as saved. See
//! [`DatabaseTransactionManager`](crate::manager::DatabaseTransactionManager).

use crate::descriptor::{Descriptor, FileReference};
use crate::error::{PendingError, Result};
use crate::model::Database;
use std::fs;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DatabaseFile {
    reference: FileReference,
    pub database: Database,
    applied_pending: usize,
}

impl DatabaseFile {
    pub fn new(reference: FileReference, database: Database) -> Self {
        Self {
            reference,
            database,
            applied_pending: 0,
        }
    }

    /// Reads the database JSON at the reference's location.
    pub fn load(reference: FileReference) -> Result<Self> {
        let content = fs::read_to_string(reference.location()).map_err(PendingError::Io)?;
        let database: Database = serde_json::from_str(&content).map_err(PendingError::Serialization)?;
        Ok(Self::new(reference, database))
    }

    /// Writes a fresh, empty database. Fails if the file already exists.
    pub fn create(reference: FileReference, name: &str) -> Result<Self> {
        if reference.location().exists() {
            return Err(PendingError::Store(format!(
                "Database file already exists: {}",
                reference.location().display()
            )));
        }
        let file = Self::new(reference, Database::new(name));
        file.save()?;
        Ok(file)
    }

    /// Atomically writes the database JSON (temp file + rename).
    pub fn save(&self) -> Result<()> {
        let path = self.reference.location();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(PendingError::Io)?;
            }
        }

        let content =
            serde_json::to_string_pretty(&self.database).map_err(PendingError::Serialization)?;
        let tmp_path = path.with_file_name(format!(".db-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, content).map_err(PendingError::Io)?;
        fs::rename(&tmp_path, path).map_err(PendingError::Io)?;
        Ok(())
    }

    pub fn reference(&self) -> &FileReference {
        &self.reference
    }

    pub fn descriptor(&self) -> Result<Descriptor> {
        self.reference.descriptor()
    }

    /// Leading pending operations already applied to `database`.
    pub fn applied_pending_operations(&self) -> usize {
        self.applied_pending
    }

    pub(crate) fn advance_watermark(&mut self, applied: usize) {
        self.applied_pending += applied;
    }

    pub(crate) fn reset_watermark(&mut self) {
        self.applied_pending = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::DatabaseFixture;

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let reference = FileReference::new(dir.path().join("vault.json"));
        let fixture = DatabaseFixture::new().with_entry("Bank", "https://bank.example");

        DatabaseFile::new(reference.clone(), fixture.database.clone())
            .save()
            .unwrap();
        let loaded = DatabaseFile::load(reference).unwrap();

        assert_eq!(loaded.database, fixture.database);
        assert_eq!(loaded.applied_pending_operations(), 0);
    }

    #[test]
    fn create_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let reference = FileReference::new(dir.path().join("vault.json"));

        DatabaseFile::create(reference.clone(), "Vault").unwrap();
        assert!(DatabaseFile::create(reference, "Vault").is_err());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatabaseFile::load(FileReference::new(dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, PendingError::Io(_)));
    }

    #[test]
    fn watermark_advances_and_resets() {
        let mut file = DatabaseFile::new(FileReference::new("vault.json"), Database::default());
        file.advance_watermark(2);
        file.advance_watermark(3);
        assert_eq!(file.applied_pending_operations(), 5);
        file.reset_watermark();
        assert_eq!(file.applied_pending_operations(), 0);
    }
}
