//! File references and their stable descriptors.
//!
//! A database file can be reached through different paths or bookmarks over time. The
//! pending-transaction store must not care: records are keyed by a [`Descriptor`] built
//! from the storage provider and the file name only.

use crate::error::{PendingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const LOCAL_PROVIDER: &str = "local";

/// Opaque key identifying one physical database file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptor(String);

impl Descriptor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    location: PathBuf,
    provider: Option<String>,
}

impl FileReference {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn provider(&self) -> &str {
        self.provider.as_deref().unwrap_or(LOCAL_PROVIDER)
    }

    /// Resolves the descriptor: `<provider>:<file name>`.
    pub fn descriptor(&self) -> Result<Descriptor> {
        let name = self
            .location
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PendingError::DescriptorUnavailable(self.location.display().to_string()))?;
        Ok(Descriptor(format!("{}:{}", self.provider(), name)))
    }
}
