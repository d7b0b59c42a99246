//! Quick-type credential index.
//!
//! After an entry is edited the OS-level AutoFill suggestion list ("quick type" bar)
//! must learn about the new user name and URLs. The transaction log only triggers the
//! update; what the index does with it is up to the implementation.

use crate::model::Entry;
use std::collections::HashMap;
use uuid::Uuid;

/// A single credential suggestion derived from an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialIdentity {
    pub user: String,
    pub service: String,
}

pub trait QuickTypeIndex {
    /// Refresh the identities derived from `entry`.
    fn update_identities(&mut self, entry: &Entry);
}

/// Index that ignores every update. Used where no OS index exists.
#[derive(Debug, Default)]
pub struct NullQuickTypeIndex;

impl QuickTypeIndex for NullQuickTypeIndex {
    fn update_identities(&mut self, _entry: &Entry) {}
}

/// Keeps identities in memory, keyed by entry UUID.
#[derive(Debug, Default)]
pub struct MemoryQuickTypeIndex {
    identities: HashMap<Uuid, Vec<CredentialIdentity>>,
    updates: usize,
}

impl MemoryQuickTypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identities(&self, entry: Uuid) -> &[CredentialIdentity] {
        self.identities
            .get(&entry)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// How many times the index was asked to refresh.
    pub fn update_count(&self) -> usize {
        self.updates
    }
}

impl QuickTypeIndex for MemoryQuickTypeIndex {
    fn update_identities(&mut self, entry: &Entry) {
        self.updates += 1;

        let user = entry.resolve(entry.user_name());
        if user.is_empty() {
            self.identities.remove(&entry.uuid);
            return;
        }

        let identities: Vec<CredentialIdentity> = entry
            .url_fields()
            .map(|f| entry.resolve(&f.value))
            .filter(|url| !url.is_empty())
            .map(|service| CredentialIdentity {
                user: user.clone(),
                service,
            })
            .collect();

        if identities.is_empty() {
            self.identities.remove(&entry.uuid);
        } else {
            self.identities.insert(entry.uuid, identities);
        }
    }
}
