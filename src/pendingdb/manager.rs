//! # Transaction Manager
//!
//! [`DatabaseTransactionManager`] is the façade through which both the AutoFill
//! extension and the main app reach the pending-transaction store. It holds no state of
//! its own besides the injected [`SecureStore`].
//!
//! ## Primitives
//!
//! - [`has_pending_transaction`](DatabaseTransactionManager::has_pending_transaction):
//!   existence check, never fails
//! - [`get_pending_transaction`](DatabaseTransactionManager::get_pending_transaction):
//!   load and decode
//! - [`update_pending_transaction`](DatabaseTransactionManager::update_pending_transaction):
//!   read-modify-write, the single choke point for every mutation
//!
//! ## Flows
//!
//! ```text
//! extension:  add_pending_operations(file, ops, apply)
//!                 └─ update: append ─┐
//!                                    ▼
//!                           [ store: descriptor → {"operations": …} ]
//!                                    │
//! main app:   apply_unapplied_pending_operations(file)   strict, then recovery
//!             file.save()                                 caller persists the tree
//!             commit_applied_operations(file)             drop applied prefix
//! ```
//!
//! ## Failure Policy
//!
//! Read paths favor availability: unreadable records are logged and treated as
//! "nothing pending". Mutation paths propagate store failures so the caller knows a
//! persist did not happen. A file whose descriptor cannot be resolved trips a debug
//! assertion and otherwise counts as having nothing pending.
//!
//! The read-modify-write in `update_pending_transaction` is not atomic across processes.

use crate::database_file::DatabaseFile;
use crate::descriptor::{Descriptor, FileReference};
use crate::error::Result;
use crate::operation::DatabaseOperation;
use crate::quicktype::QuickTypeIndex;
use crate::store::SecureStore;
use crate::transaction::{PendingTransaction, DEFAULT_RECOVERY_GROUP_TITLE};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of replaying pending operations onto a database file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub applied: usize,
    /// Set when the replay had to fall back to a recovery group and kept it.
    pub recovery_group: Option<Uuid>,
}

pub struct DatabaseTransactionManager<S: SecureStore> {
    store: S,
    recovery_title: String,
}

impl<S: SecureStore> DatabaseTransactionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            recovery_title: DEFAULT_RECOVERY_GROUP_TITLE.to_string(),
        }
    }

    pub fn with_recovery_title(mut self, title: impl Into<String>) -> Self {
        self.recovery_title = title.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn has_pending_transaction(&self, descriptor: &Descriptor) -> bool {
        match self.store.get(descriptor) {
            Ok(record) => record.is_some(),
            Err(e) => {
                warn!(%descriptor, error = %e, "pending transaction lookup failed");
                false
            }
        }
    }

    pub fn get_pending_transaction(
        &self,
        reference: &FileReference,
    ) -> Result<Option<PendingTransaction>> {
        match resolve_descriptor(reference) {
            Some(descriptor) => self.load(&descriptor),
            None => Ok(None),
        }
    }

    /// Read-modify-write of the record for `descriptor`.
    ///
    /// `updater` receives the current transaction (or `None`) and returns the one to
    /// store. Returning `None`, or an empty transaction, erases the record.
    pub fn update_pending_transaction<F>(&self, descriptor: &Descriptor, updater: F) -> Result<()>
    where
        F: FnOnce(Option<PendingTransaction>) -> Option<PendingTransaction>,
    {
        let current = self.load(descriptor)?;
        match updater(current).filter(|tx| !tx.is_empty()) {
            Some(tx) => self.store.set(descriptor, &tx.to_bytes()?),
            None => {
                debug!(%descriptor, "erasing pending transaction");
                self.store.erase(descriptor)
            }
        }
    }

    /// Queues `operations` for `file`, optionally applying them to its tree right away.
    ///
    /// If the immediate apply fails the error is returned and the operations stay queued.
    pub fn add_pending_operations(
        &self,
        file: &mut DatabaseFile,
        operations: Vec<DatabaseOperation>,
        apply: bool,
        index: &mut dyn QuickTypeIndex,
    ) -> Result<()> {
        if operations.is_empty() {
            return Ok(());
        }
        let descriptor = file.descriptor()?;
        let added = operations.len();

        self.update_pending_transaction(&descriptor, |existing| {
            let mut tx = existing.unwrap_or_default();
            tx.add(operations);
            Some(tx)
        })?;
        debug!(%descriptor, added, "queued pending operations");

        if apply {
            self.apply_unapplied_pending_operations(file, index)?;
        }
        Ok(())
    }

    /// Replays every queued operation past the file's watermark.
    ///
    /// Tries a strict replay first and falls back to recovery mode if it fails.
    pub fn apply_unapplied_pending_operations(
        &self,
        file: &mut DatabaseFile,
        index: &mut dyn QuickTypeIndex,
    ) -> Result<ReplayOutcome> {
        let Some(descriptor) = resolve_descriptor(file.reference()) else {
            return Ok(ReplayOutcome::default());
        };
        let Some(mut tx) = self.load(&descriptor)? else {
            return Ok(ReplayOutcome::default());
        };

        let start = file.applied_pending_operations();
        let strict = tx.apply_titled(&mut file.database, start, false, &self.recovery_title, index);
        let applied = match strict {
            Ok(applied) => applied,
            Err(e) if e.is_structural() => {
                warn!(%descriptor, error = %e, "strict replay failed, retrying in recovery mode");
                tx.apply_titled(&mut file.database, start, true, &self.recovery_title, index)?
            }
            Err(e) => return Err(e),
        };

        file.advance_watermark(applied);
        if let Some(group) = tx.recovery_group() {
            info!(%descriptor, %group, "pending operations recovered into quarantine group");
        }
        Ok(ReplayOutcome {
            applied,
            recovery_group: tx.recovery_group(),
        })
    }

    /// Drops the operations already applied to `file` from its pending transaction.
    ///
    /// Call after the database file was saved. Returns the number of operations dropped.
    pub fn commit_applied_operations(&self, file: &mut DatabaseFile) -> Result<usize> {
        let applied = file.applied_pending_operations();
        if applied == 0 {
            return Ok(0);
        }
        let Some(descriptor) = resolve_descriptor(file.reference()) else {
            file.reset_watermark();
            return Ok(0);
        };

        self.update_pending_transaction(&descriptor, |existing| {
            let mut tx = existing?;
            tx.drop_first(applied);
            Some(tx)
        })?;
        file.reset_watermark();
        Ok(applied)
    }

    pub fn discard_pending_transaction(&self, descriptor: &Descriptor) -> Result<()> {
        self.store.erase(descriptor)
    }

    fn load(&self, descriptor: &Descriptor) -> Result<Option<PendingTransaction>> {
        let Some(bytes) = self.store.get(descriptor)? else {
            return Ok(None);
        };
        match PendingTransaction::from_bytes(&bytes) {
            Ok(tx) => Ok(Some(tx)),
            Err(e) => {
                warn!(%descriptor, error = %e, "ignoring unreadable pending transaction");
                Ok(None)
            }
        }
    }
}

fn resolve_descriptor(reference: &FileReference) -> Option<Descriptor> {
    match reference.descriptor() {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            debug_assert!(false, "descriptor resolution failed: {}", e);
            warn!(error = %e, "no descriptor for database file, assuming nothing is pending");
            None
        }
    }
}
