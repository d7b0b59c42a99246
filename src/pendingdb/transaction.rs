//! # Pending Transactions
//!
//! A [`PendingTransaction`] is the ordered log of operations queued for one database
//! file. The log only grows at the end ([`PendingTransaction::add`]) and only shrinks
//! at the front ([`PendingTransaction::drop_first`]) once the consumer confirms those
//! operations reached the real database file.
//!
//! ## Replay
//!
//! [`PendingTransaction::apply`] replays the suffix starting at a watermark, strictly in
//! order, stopping at the first failure. Mutations made before the failure stay in the
//! tree; there is no rollback.
//!
//! In recovery mode a dated "Recovered Entries" group is created under the root and
//! used as the replacement parent for anything whose target is missing. The group is
//! removed again if nothing ended up in it.
//!
//! ## Persisted Form
//!
//! ```text
//! {"operations":[{"kind":"createEntry",…},{"kind":"editEntry",…}]}
//! ```

use crate::error::Result;
use crate::model::{Database, Group};
use crate::operation::{DatabaseOperation, RecoveryConfig};
use crate::quicktype::QuickTypeIndex;
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_RECOVERY_GROUP_TITLE: &str = "Recovered Entries";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingTransaction {
    operations: Vec<DatabaseOperation>,
    /// Recovery group kept by the last apply, if any.
    #[serde(skip)]
    recovery_group: Option<Uuid>,
}

impl PendingTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_operations(operations: Vec<DatabaseOperation>) -> Self {
        Self {
            operations,
            recovery_group: None,
        }
    }

    pub fn add<I>(&mut self, operations: I)
    where
        I: IntoIterator<Item = DatabaseOperation>,
    {
        self.operations.extend(operations);
    }

    /// Removes the first `n` operations (all of them if `n` exceeds the count).
    pub fn drop_first(&mut self, n: usize) {
        let n = n.min(self.operations.len());
        self.operations.drain(..n);
    }

    pub fn count(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[DatabaseOperation] {
        &self.operations
    }

    pub fn recovery_group(&self) -> Option<Uuid> {
        self.recovery_group
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Replays the operations from `starting_from` onward and returns how many were applied.
    pub fn apply(
        &mut self,
        db: &mut Database,
        starting_from: usize,
        recovery_mode: bool,
        index: &mut dyn QuickTypeIndex,
    ) -> Result<usize> {
        self.apply_titled(
            db,
            starting_from,
            recovery_mode,
            DEFAULT_RECOVERY_GROUP_TITLE,
            index,
        )
    }

    /// Same as [`apply`](Self::apply), naming the recovery group with `recovery_title`.
    pub fn apply_titled(
        &mut self,
        db: &mut Database,
        starting_from: usize,
        recovery_mode: bool,
        recovery_title: &str,
        index: &mut dyn QuickTypeIndex,
    ) -> Result<usize> {
        self.recovery_group = None;

        let pending = match self.operations.get(starting_from..) {
            Some(ops) if !ops.is_empty() => ops,
            _ => return Ok(0),
        };
        let attempted = pending.len();
        debug!(starting_from, attempted, recovery_mode, "replaying pending operations");

        let recovery = recovery_mode.then(|| {
            let now = Local::now();
            let name = format!("{} ({})", recovery_title, now.format("%Y-%m-%d %H:%M"));
            let group = db.root.create_group(name, now.with_timezone(&Utc));
            RecoveryConfig::quarantine(group.uuid)
        });

        let mut outcome = Ok(());
        for (offset, op) in pending.iter().enumerate() {
            if let Err(e) = op.apply(db, recovery.as_ref(), index) {
                warn!(
                    position = starting_from + offset,
                    kind = %op.kind(),
                    error = %e,
                    "pending operation failed, aborting replay"
                );
                outcome = Err(e);
                break;
            }
        }

        if let Some(config) = &recovery {
            let group = config.replacement_parent;
            if db.find_group(group).is_some_and(Group::is_empty) {
                db.root.remove_group(group);
            } else {
                info!(%group, "keeping recovery group with recovered items");
                self.recovery_group = Some(group);
            }
        }

        outcome.map(|()| attempted)
    }
}
