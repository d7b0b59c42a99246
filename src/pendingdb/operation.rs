//! # Database Operations
//!
//! A [`DatabaseOperation`] is one serializable mutation intent: create an entry, edit
//! its fields, or add a URL to it. Operations are queued in a
//! [`PendingTransaction`](crate::transaction::PendingTransaction) and replayed later,
//! possibly more than once, so every `apply` must tolerate at-least-once delivery:
//!
//! - creating an entry that already exists is accepted in recovery mode
//! - editing re-sets the same field values
//! - adding a URL that is already present is a no-op
//!
//! ## Recovery
//!
//! When a [`RecoveryConfig`] is supplied, a missing parent group or target entry is
//! redirected to `replacement_parent` (the quarantine group) instead of failing. Without
//! it, the operation fails with [`PendingError::ParentNotFound`],
//! [`PendingError::EntryNotFound`] or [`PendingError::EntryAlreadyExists`].
//!
//! ## Wire Format
//!
//! Operations are internally tagged by `kind`:
//!
//! ```text
//! {"kind":"createEntry","entryUUID":"…","parentUUID":"…","creationTime":"…"}
//! {"kind":"editEntry","entryUUID":"…","modificationTime":"…","fields":[{"name":"…","value":"…","isProtected":false}]}
//! {"kind":"addEntryURL","entryUUID":"…","modificationTime":"…","url":"…"}
//! ```

use crate::error::{PendingError, Result};
use crate::model::{Database, Entry, FIELD_URL};
use crate::quicktype::QuickTypeIndex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateEntry,
    EditEntry,
    AddEntryUrl,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::CreateEntry => "createEntry",
            OperationKind::EditEntry => "editEntry",
            OperationKind::AddEntryUrl => "addEntryURL",
        };
        f.write_str(name)
    }
}

/// Governs how a replay handles missing or duplicated targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryConfig {
    pub replacement_parent: Uuid,
    pub accept_if_exists: bool,
    pub create_if_missing: bool,
}

impl RecoveryConfig {
    /// Redirect everything missing into `group` and accept existing entries.
    pub fn quarantine(group: Uuid) -> Self {
        Self {
            replacement_parent: group,
            accept_if_exists: true,
            create_if_missing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DatabaseOperation {
    #[serde(rename = "createEntry")]
    CreateEntry(CreateEntryOperation),
    #[serde(rename = "editEntry")]
    EditEntry(EditEntryOperation),
    #[serde(rename = "addEntryURL")]
    AddEntryUrl(AddEntryUrlOperation),
}

impl DatabaseOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            DatabaseOperation::CreateEntry(_) => OperationKind::CreateEntry,
            DatabaseOperation::EditEntry(_) => OperationKind::EditEntry,
            DatabaseOperation::AddEntryUrl(_) => OperationKind::AddEntryUrl,
        }
    }

    pub fn entry_uuid(&self) -> Uuid {
        match self {
            DatabaseOperation::CreateEntry(op) => op.entry_uuid,
            DatabaseOperation::EditEntry(op) => op.entry_uuid,
            DatabaseOperation::AddEntryUrl(op) => op.entry_uuid,
        }
    }

    /// When the user made the change.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DatabaseOperation::CreateEntry(op) => op.creation_time,
            DatabaseOperation::EditEntry(op) => op.modification_time,
            DatabaseOperation::AddEntryUrl(op) => op.modification_time,
        }
    }

    pub fn apply(
        &self,
        db: &mut Database,
        recovery: Option<&RecoveryConfig>,
        index: &mut dyn QuickTypeIndex,
    ) -> Result<()> {
        debug!(kind = %self.kind(), entry = %self.entry_uuid(), "applying operation");
        match self {
            DatabaseOperation::CreateEntry(op) => op.apply(db, recovery),
            DatabaseOperation::EditEntry(op) => op.apply(db, recovery, index),
            DatabaseOperation::AddEntryUrl(op) => op.apply(db, recovery, index),
        }
    }
}

impl From<CreateEntryOperation> for DatabaseOperation {
    fn from(op: CreateEntryOperation) -> Self {
        DatabaseOperation::CreateEntry(op)
    }
}

impl From<EditEntryOperation> for DatabaseOperation {
    fn from(op: EditEntryOperation) -> Self {
        DatabaseOperation::EditEntry(op)
    }
}

impl From<AddEntryUrlOperation> for DatabaseOperation {
    fn from(op: AddEntryUrlOperation) -> Self {
        DatabaseOperation::AddEntryUrl(op)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryOperation {
    #[serde(rename = "entryUUID")]
    pub entry_uuid: Uuid,
    #[serde(rename = "parentUUID")]
    pub parent_uuid: Uuid,
    pub creation_time: DateTime<Utc>,
}

impl CreateEntryOperation {
    pub fn new(entry_uuid: Uuid, parent_uuid: Uuid, creation_time: DateTime<Utc>) -> Self {
        Self {
            entry_uuid,
            parent_uuid,
            creation_time,
        }
    }

    fn apply(&self, db: &mut Database, recovery: Option<&RecoveryConfig>) -> Result<()> {
        let parent_uuid = resolve_parent(db, self.parent_uuid, recovery)?;

        if let Some(existing) = db.find_entry_mut(self.entry_uuid) {
            if recovery.is_some_and(|r| r.accept_if_exists) {
                debug!(entry = %self.entry_uuid, "entry already exists, accepting it");
                existing.backup_state();
                return Ok(());
            }
            return Err(PendingError::EntryAlreadyExists(self.entry_uuid));
        }

        let parent = db
            .find_group_mut(parent_uuid)
            .ok_or(PendingError::ParentNotFound(parent_uuid))?;
        parent.create_entry(self.entry_uuid, self.creation_time);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub name: String,
    pub value: String,
    pub is_protected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEntryOperation {
    #[serde(rename = "entryUUID")]
    pub entry_uuid: Uuid,
    pub modification_time: DateTime<Utc>,
    #[serde(default)]
    pub fields: Vec<FieldChange>,
}

impl EditEntryOperation {
    pub fn new(entry_uuid: Uuid, modification_time: DateTime<Utc>) -> Self {
        Self {
            entry_uuid,
            modification_time,
            fields: Vec::new(),
        }
    }

    /// Queues a field change. Changes are applied in the order they were added.
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        is_protected: bool,
    ) -> Self {
        self.fields.push(FieldChange {
            name: name.into(),
            value: value.into(),
            is_protected,
        });
        self
    }

    fn apply(
        &self,
        db: &mut Database,
        recovery: Option<&RecoveryConfig>,
        index: &mut dyn QuickTypeIndex,
    ) -> Result<()> {
        let (entry, created) = resolve_entry(db, self.entry_uuid, self.modification_time, recovery)?;
        if !created {
            entry.backup_state();
        }
        entry.last_modification_time = self.modification_time;
        for change in &self.fields {
            entry.set_field(&change.name, &change.value, change.is_protected);
        }
        index.update_identities(entry);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryUrlOperation {
    #[serde(rename = "entryUUID")]
    pub entry_uuid: Uuid,
    pub modification_time: DateTime<Utc>,
    pub url: String,
}

impl AddEntryUrlOperation {
    pub fn new(entry_uuid: Uuid, modification_time: DateTime<Utc>, url: impl Into<String>) -> Self {
        Self {
            entry_uuid,
            modification_time,
            url: url.into(),
        }
    }

    fn apply(
        &self,
        db: &mut Database,
        recovery: Option<&RecoveryConfig>,
        index: &mut dyn QuickTypeIndex,
    ) -> Result<()> {
        let (entry, created) = resolve_entry(db, self.entry_uuid, self.modification_time, recovery)?;

        let present = entry
            .url_fields()
            .any(|field| entry.resolve(&field.value) == self.url);
        if present {
            debug!(entry = %self.entry_uuid, "URL already present, skipping");
            return Ok(());
        }

        if !created {
            entry.backup_state();
        }
        entry.last_modification_time = self.modification_time;
        if entry.url().is_empty() {
            entry.set_field(FIELD_URL, &self.url, false);
        } else {
            let name = entry.next_extra_url_name();
            entry.set_field(&name, &self.url, false);
        }
        index.update_identities(entry);
        Ok(())
    }
}

fn resolve_parent(db: &Database, parent: Uuid, recovery: Option<&RecoveryConfig>) -> Result<Uuid> {
    if db.find_group(parent).is_some() {
        return Ok(parent);
    }
    match recovery {
        Some(r) if r.create_if_missing => {
            debug!(%parent, replacement = %r.replacement_parent, "parent missing, redirecting");
            Ok(r.replacement_parent)
        }
        _ => Err(PendingError::ParentNotFound(parent)),
    }
}

/// Finds the target entry, creating it under the replacement parent when recovery allows.
/// The flag is true when the entry was created here.
fn resolve_entry<'a>(
    db: &'a mut Database,
    uuid: Uuid,
    time: DateTime<Utc>,
    recovery: Option<&RecoveryConfig>,
) -> Result<(&'a mut Entry, bool)> {
    let mut created = false;
    if !db.contains_entry(uuid) {
        match recovery {
            Some(r) if r.create_if_missing => {
                debug!(entry = %uuid, replacement = %r.replacement_parent, "entry missing, recreating");
                let parent = db
                    .find_group_mut(r.replacement_parent)
                    .ok_or(PendingError::ParentNotFound(r.replacement_parent))?;
                parent.create_entry(uuid, time);
                created = true;
            }
            _ => return Err(PendingError::EntryNotFound(uuid)),
        }
    }
    let entry = db
        .find_entry_mut(uuid)
        .ok_or(PendingError::EntryNotFound(uuid))?;
    Ok((entry, created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::DatabaseFixture;
    use crate::model::{FIELD_PASSWORD, FIELD_TITLE, FIELD_USERNAME};
    use crate::quicktype::{MemoryQuickTypeIndex, NullQuickTypeIndex};
    use chrono::Duration;

    fn apply(op: impl Into<DatabaseOperation>, db: &mut Database) -> Result<()> {
        op.into().apply(db, None, &mut NullQuickTypeIndex)
    }

    fn apply_recovering(
        op: impl Into<DatabaseOperation>,
        db: &mut Database,
        quarantine: Uuid,
    ) -> Result<()> {
        let recovery = RecoveryConfig::quarantine(quarantine);
        op.into().apply(db, Some(&recovery), &mut NullQuickTypeIndex)
    }

    // --- CreateEntry ---

    #[test]
    fn create_entry_under_parent() {
        let mut fixture = DatabaseFixture::new();
        let parent = fixture.add_group("Web");
        let uuid = Uuid::new_v4();
        let time = Utc::now() - Duration::minutes(5);

        apply(CreateEntryOperation::new(uuid, parent, time), &mut fixture.database).unwrap();

        let group = fixture.database.find_group(parent).unwrap();
        assert_eq!(group.entries.len(), 1);
        let entry = &group.entries[0];
        assert_eq!(entry.uuid, uuid);
        assert_eq!(entry.creation_time, time);
        assert_eq!(entry.last_modification_time, time);
        assert_eq!(entry.last_access_time, time);
    }

    #[test]
    fn create_entry_fails_when_parent_missing() {
        let mut fixture = DatabaseFixture::new();
        let missing = Uuid::new_v4();

        let err = apply(
            CreateEntryOperation::new(Uuid::new_v4(), missing, Utc::now()),
            &mut fixture.database,
        )
        .unwrap_err();
        assert!(matches!(err, PendingError::ParentNotFound(id) if id == missing));
    }

    #[test]
    fn create_entry_redirects_to_replacement_parent() {
        let mut fixture = DatabaseFixture::new();
        let quarantine = fixture.add_group("Recovered");
        let uuid = Uuid::new_v4();

        apply_recovering(
            CreateEntryOperation::new(uuid, Uuid::new_v4(), Utc::now()),
            &mut fixture.database,
            quarantine,
        )
        .unwrap();

        let group = fixture.database.find_group(quarantine).unwrap();
        assert_eq!(group.entries[0].uuid, uuid);
    }

    #[test]
    fn create_entry_rejects_duplicate_in_strict_mode() {
        let mut fixture = DatabaseFixture::new();
        let root = fixture.root_uuid();
        let existing = fixture.add_entry(root, "Existing", "");

        let err = apply(
            CreateEntryOperation::new(existing, root, Utc::now()),
            &mut fixture.database,
        )
        .unwrap_err();
        assert!(matches!(err, PendingError::EntryAlreadyExists(id) if id == existing));
    }

    #[test]
    fn create_entry_accepts_duplicate_in_recovery_mode() {
        let mut fixture = DatabaseFixture::new();
        let root = fixture.root_uuid();
        let quarantine = fixture.add_group("Recovered");
        let existing = fixture.add_entry(root, "Existing", "");

        apply_recovering(
            CreateEntryOperation::new(existing, root, Utc::now()),
            &mut fixture.database,
            quarantine,
        )
        .unwrap();

        assert_eq!(fixture.database.root.entry_count(), 1);
        let entry = fixture.database.find_entry(existing).unwrap();
        assert_eq!(entry.title(), "Existing");
        assert_eq!(entry.history.len(), 1);
        assert!(fixture.database.find_group(quarantine).unwrap().is_empty());
    }

    // --- EditEntry ---

    #[test]
    fn edit_entry_applies_fields_in_order() {
        let mut fixture = DatabaseFixture::new();
        let root = fixture.root_uuid();
        let uuid = fixture.add_entry(root, "Old", "");
        let time = Utc::now();

        let op = EditEntryOperation::new(uuid, time)
            .with_field(FIELD_TITLE, "First", false)
            .with_field(FIELD_USERNAME, "alice", false)
            .with_field(FIELD_TITLE, "Second", false)
            .with_field(FIELD_PASSWORD, "s3cret", true);
        apply(op, &mut fixture.database).unwrap();

        let entry = fixture.database.find_entry(uuid).unwrap();
        assert_eq!(entry.title(), "Second");
        assert_eq!(entry.user_name(), "alice");
        assert!(entry.field(FIELD_PASSWORD).unwrap().is_protected);
        assert_eq!(entry.last_modification_time, time);
        assert_eq!(entry.history.len(), 1);
        assert_eq!(entry.history[0].title(), "Old");
    }

    #[test]
    fn edit_entry_updates_quick_type_index() {
        let mut fixture = DatabaseFixture::new();
        let root = fixture.root_uuid();
        let uuid = fixture.add_entry(root, "Mail", "https://mail.example");
        let mut index = MemoryQuickTypeIndex::new();

        let op: DatabaseOperation = EditEntryOperation::new(uuid, Utc::now())
            .with_field(FIELD_USERNAME, "alice", false)
            .into();
        op.apply(&mut fixture.database, None, &mut index).unwrap();

        assert_eq!(index.identities(uuid)[0].user, "alice");
        assert_eq!(index.identities(uuid)[0].service, "https://mail.example");
    }

    #[test]
    fn edit_entry_fails_when_entry_missing() {
        let mut fixture = DatabaseFixture::new();
        let missing = Uuid::new_v4();

        let err = apply(EditEntryOperation::new(missing, Utc::now()), &mut fixture.database)
            .unwrap_err();
        assert!(matches!(err, PendingError::EntryNotFound(id) if id == missing));
    }

    #[test]
    fn edit_entry_recreates_missing_entry_in_quarantine() {
        let mut fixture = DatabaseFixture::new();
        let quarantine = fixture.add_group("Recovered");
        let missing = Uuid::new_v4();
        let time = Utc::now();

        apply_recovering(
            EditEntryOperation::new(missing, time).with_field(FIELD_TITLE, "Lost", false),
            &mut fixture.database,
            quarantine,
        )
        .unwrap();

        let group = fixture.database.find_group(quarantine).unwrap();
        let entry = &group.entries[0];
        assert_eq!(entry.uuid, missing);
        assert_eq!(entry.title(), "Lost");
        assert_eq!(entry.creation_time, time);
        assert!(entry.history.is_empty());
    }

    // --- AddEntryURL ---

    #[test]
    fn add_url_fills_empty_primary_url() {
        let mut fixture = DatabaseFixture::new();
        let root = fixture.root_uuid();
        let uuid = fixture.add_entry(root, "Site", "");

        apply(
            AddEntryUrlOperation::new(uuid, Utc::now(), "https://site.example"),
            &mut fixture.database,
        )
        .unwrap();

        let entry = fixture.database.find_entry(uuid).unwrap();
        assert_eq!(entry.url(), "https://site.example");
        assert!(entry.field("KP2A_URL").is_none());
    }

    #[test]
    fn add_url_appends_extra_url_field() {
        let mut fixture = DatabaseFixture::new();
        let root = fixture.root_uuid();
        let uuid = fixture.add_entry(root, "Site", "https://a.example");

        apply(
            AddEntryUrlOperation::new(uuid, Utc::now(), "https://b.example"),
            &mut fixture.database,
        )
        .unwrap();
        apply(
            AddEntryUrlOperation::new(uuid, Utc::now(), "https://c.example"),
            &mut fixture.database,
        )
        .unwrap();

        let entry = fixture.database.find_entry(uuid).unwrap();
        assert_eq!(entry.url(), "https://a.example");
        assert_eq!(entry.value("KP2A_URL"), Some("https://b.example"));
        assert_eq!(entry.value("KP2A_URL_1"), Some("https://c.example"));
    }

    #[test]
    fn add_url_twice_keeps_a_single_field() {
        let mut fixture = DatabaseFixture::new();
        let root = fixture.root_uuid();
        let uuid = fixture.add_entry(root, "Site", "https://a.example");
        let op = AddEntryUrlOperation::new(uuid, Utc::now(), "https://x.example");

        apply(op.clone(), &mut fixture.database).unwrap();
        apply(op, &mut fixture.database).unwrap();

        let entry = fixture.database.find_entry(uuid).unwrap();
        let matching = entry
            .url_fields()
            .filter(|f| f.value == "https://x.example")
            .count();
        assert_eq!(matching, 1);
        assert_eq!(entry.history.len(), 1);
    }

    #[test]
    fn add_url_matches_resolved_placeholder_value() {
        let mut fixture = DatabaseFixture::new();
        let root = fixture.root_uuid();
        let uuid = fixture.add_entry(root, "Site", "https://{USERNAME}.example");
        fixture
            .database
            .find_entry_mut(uuid)
            .unwrap()
            .set_field(FIELD_USERNAME, "alice", false);

        apply(
            AddEntryUrlOperation::new(uuid, Utc::now(), "https://alice.example"),
            &mut fixture.database,
        )
        .unwrap();

        let entry = fixture.database.find_entry(uuid).unwrap();
        assert_eq!(entry.url_fields().count(), 1);
        assert!(entry.history.is_empty());
    }

    // --- Serialization ---

    #[test]
    fn operations_are_tagged_by_kind() {
        let uuid = Uuid::new_v4();
        let op: DatabaseOperation =
            AddEntryUrlOperation::new(uuid, Utc::now(), "https://x.example").into();

        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["kind"], "addEntryURL");
        assert_eq!(value["entryUUID"], uuid.to_string());
        assert_eq!(value["url"], "https://x.example");
        assert_eq!(op.kind().to_string(), "addEntryURL");
    }

    #[test]
    fn decodes_unknown_kind_as_error() {
        let json = r#"{"kind":"deleteEntry","entryUUID":"00000000-0000-0000-0000-000000000000"}"#;
        assert!(serde_json::from_str::<DatabaseOperation>(json).is_err());
    }
}
