//! # Domain Model: Groups, Entries and Fields
//!
//! The transaction log operates on a tree of groups and entries, each carrying a
//! stable UUID. In the full application this tree is provided by the KeePass database
//! library; here it is a small serde-serializable model exposing just what the
//! operations need:
//!
//! - lookup by UUID anywhere in the tree ([`Group::find_entry_mut`], [`Group::find_group_mut`])
//! - creation of entries and groups under a given group
//! - field setters, history snapshots ([`Entry::backup_state`]) and timestamps
//!
//! ## Fields
//!
//! Every entry starts with the five standard fields (`Title`, `UserName`, `Password`,
//! `URL`, `Notes`). Additional URLs live in "extra URL" fields named `KP2A_URL`,
//! `KP2A_URL_1`, `KP2A_URL_2`, and so on.
//!
//! ## Placeholders
//!
//! Field values may reference other fields of the same entry with `{TITLE}`, `{USERNAME}`,
//! `{URL}`, `{PASSWORD}` or `{NOTES}`. [`Entry::resolved_value`] expands these one level
//! deep; unknown placeholders are left untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const FIELD_TITLE: &str = "Title";
pub const FIELD_USERNAME: &str = "UserName";
pub const FIELD_PASSWORD: &str = "Password";
pub const FIELD_URL: &str = "URL";
pub const FIELD_NOTES: &str = "Notes";

pub const EXTRA_URL_PREFIX: &str = "KP2A_URL";

/// Returns true for `KP2A_URL` and `KP2A_URL_<n>` field names.
pub fn is_extra_url_name(name: &str) -> bool {
    match name.strip_prefix(EXTRA_URL_PREFIX) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('_')
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit())),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub is_protected: bool,
}

impl EntryField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, is_protected: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_protected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub uuid: Uuid,
    pub fields: Vec<EntryField>,
    pub creation_time: DateTime<Utc>,
    pub last_modification_time: DateTime<Utc>,
    pub last_access_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Entry>,
}

impl Entry {
    /// A blank entry with the standard fields and all timestamps set to `time`.
    pub fn new(uuid: Uuid, time: DateTime<Utc>) -> Self {
        Self {
            uuid,
            fields: vec![
                EntryField::new(FIELD_TITLE, "", false),
                EntryField::new(FIELD_USERNAME, "", false),
                EntryField::new(FIELD_PASSWORD, "", true),
                EntryField::new(FIELD_URL, "", false),
                EntryField::new(FIELD_NOTES, "", false),
            ],
            creation_time: time,
            last_modification_time: time,
            last_access_time: time,
            history: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&EntryField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value.as_str())
    }

    pub fn title(&self) -> &str {
        self.value(FIELD_TITLE).unwrap_or_default()
    }

    pub fn user_name(&self) -> &str {
        self.value(FIELD_USERNAME).unwrap_or_default()
    }

    pub fn url(&self) -> &str {
        self.value(FIELD_URL).unwrap_or_default()
    }

    /// Sets the value and protection of `name`, appending the field if it does not exist.
    pub fn set_field(&mut self, name: &str, value: &str, is_protected: bool) {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value.to_string();
                field.is_protected = is_protected;
            }
            None => self.fields.push(EntryField::new(name, value, is_protected)),
        }
    }

    /// Pushes a snapshot of the current state onto the entry's history.
    pub fn backup_state(&mut self) {
        let mut snapshot = self.clone();
        snapshot.history.clear();
        self.history.push(snapshot);
    }

    /// The primary URL field followed by every extra URL field.
    pub fn url_fields(&self) -> impl Iterator<Item = &EntryField> {
        self.fields
            .iter()
            .filter(|f| f.name == FIELD_URL || is_extra_url_name(&f.name))
    }

    /// First unused extra URL field name.
    pub fn next_extra_url_name(&self) -> String {
        if self.field(EXTRA_URL_PREFIX).is_none() {
            return EXTRA_URL_PREFIX.to_string();
        }
        (1..)
            .map(|n| format!("{}_{}", EXTRA_URL_PREFIX, n))
            .find(|name| self.field(name).is_none())
            .unwrap_or_else(|| EXTRA_URL_PREFIX.to_string())
    }

    pub fn resolved_value(&self, name: &str) -> Option<String> {
        self.value(name).map(|v| self.resolve(v))
    }

    /// Expands same-entry placeholders in `value`, one level deep.
    pub fn resolve(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            let Some(end) = tail.find('}') else {
                out.push_str(tail);
                rest = "";
                break;
            };
            match self.placeholder(&tail[1..end]) {
                Some(replacement) => out.push_str(replacement),
                None => out.push_str(&tail[..=end]),
            }
            rest = &tail[end + 1..];
        }
        out.push_str(rest);
        out
    }

    fn placeholder(&self, token: &str) -> Option<&str> {
        let field = match token.to_ascii_uppercase().as_str() {
            "TITLE" => FIELD_TITLE,
            "USERNAME" => FIELD_USERNAME,
            "URL" => FIELD_URL,
            "PASSWORD" => FIELD_PASSWORD,
            "NOTES" => FIELD_NOTES,
            _ => return None,
        };
        Some(self.value(field).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub uuid: Uuid,
    pub name: String,
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Group {
    pub fn new(name: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self::with_uuid(Uuid::new_v4(), name, time)
    }

    pub fn with_uuid(uuid: Uuid, name: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            uuid,
            name: name.into(),
            creation_time: time,
            entries: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// No entries and no subgroups.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.groups.is_empty()
    }

    pub fn find_group(&self, uuid: Uuid) -> Option<&Group> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.groups.iter().find_map(|g| g.find_group(uuid))
    }

    pub fn find_group_mut(&mut self, uuid: Uuid) -> Option<&mut Group> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.groups.iter_mut().find_map(|g| g.find_group_mut(uuid))
    }

    pub fn find_entry(&self, uuid: Uuid) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|e| e.uuid == uuid)
            .or_else(|| self.groups.iter().find_map(|g| g.find_entry(uuid)))
    }

    pub fn find_entry_mut(&mut self, uuid: Uuid) -> Option<&mut Entry> {
        if let Some(pos) = self.entries.iter().position(|e| e.uuid == uuid) {
            return Some(&mut self.entries[pos]);
        }
        self.groups.iter_mut().find_map(|g| g.find_entry_mut(uuid))
    }

    pub fn create_entry(&mut self, uuid: Uuid, time: DateTime<Utc>) -> &mut Entry {
        let idx = self.entries.len();
        self.entries.push(Entry::new(uuid, time));
        &mut self.entries[idx]
    }

    pub fn create_group(&mut self, name: impl Into<String>, time: DateTime<Utc>) -> &mut Group {
        let idx = self.groups.len();
        self.groups.push(Group::new(name, time));
        &mut self.groups[idx]
    }

    /// Removes the group with `uuid` from anywhere below this group.
    pub fn remove_group(&mut self, uuid: Uuid) -> Option<Group> {
        if let Some(pos) = self.groups.iter().position(|g| g.uuid == uuid) {
            return Some(self.groups.remove(pos));
        }
        self.groups.iter_mut().find_map(|g| g.remove_group(uuid))
    }

    /// Number of entries in this group and all its descendants.
    pub fn entry_count(&self) -> usize {
        self.entries.len() + self.groups.iter().map(Group::entry_count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub root: Group,
}

impl Default for Database {
    fn default() -> Self {
        Self::new("Database")
    }
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            root: Group::new(name, Utc::now()),
        }
    }

    pub fn find_entry(&self, uuid: Uuid) -> Option<&Entry> {
        self.root.find_entry(uuid)
    }

    pub fn find_entry_mut(&mut self, uuid: Uuid) -> Option<&mut Entry> {
        self.root.find_entry_mut(uuid)
    }

    pub fn find_group(&self, uuid: Uuid) -> Option<&Group> {
        self.root.find_group(uuid)
    }

    pub fn find_group_mut(&mut self, uuid: Uuid) -> Option<&mut Group> {
        self.root.find_group_mut(uuid)
    }

    pub fn contains_entry(&self, uuid: Uuid) -> bool {
        self.find_entry(uuid).is_some()
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    /// Builds small database trees for tests.
    pub struct DatabaseFixture {
        pub database: Database,
    }

    impl Default for DatabaseFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DatabaseFixture {
        pub fn new() -> Self {
            Self {
                database: Database::new("Test Database"),
            }
        }

        pub fn root_uuid(&self) -> Uuid {
            self.database.root.uuid
        }

        /// Adds a group under the root and returns its UUID.
        pub fn add_group(&mut self, name: &str) -> Uuid {
            self.database.root.create_group(name, Utc::now()).uuid
        }

        /// Adds an entry with the given title and URL under `parent` and returns its UUID.
        pub fn add_entry(&mut self, parent: Uuid, title: &str, url: &str) -> Uuid {
            let uuid = Uuid::new_v4();
            let group = self
                .database
                .find_group_mut(parent)
                .expect("fixture parent group must exist");
            let entry = group.create_entry(uuid, Utc::now());
            entry.set_field(FIELD_TITLE, title, false);
            entry.set_field(FIELD_URL, url, false);
            uuid
        }

        pub fn with_group(mut self, name: &str) -> Self {
            self.add_group(name);
            self
        }

        pub fn with_entry(mut self, title: &str, url: &str) -> Self {
            let root = self.root_uuid();
            self.add_entry(root, title, url);
            self
        }
    }
}
