use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PendingError {
    #[error("Entry not found: {0}")]
    EntryNotFound(Uuid),

    #[error("Parent group not found: {0}")]
    ParentNotFound(Uuid),

    #[error("Entry already exists: {0}")]
    EntryAlreadyExists(Uuid),

    #[error("Cannot resolve a descriptor for {0}")]
    DescriptorUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl PendingError {
    /// True for the errors raised by an operation whose target is missing or duplicated.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PendingError::EntryNotFound(_)
                | PendingError::ParentNotFound(_)
                | PendingError::EntryAlreadyExists(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PendingError>;
