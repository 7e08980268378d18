use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vhs_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::hash::ContentHasher;

/// The kind of record stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Reference to an externally-owned file payload.
    Blob,
    /// Immutable collection of entry ids.
    Tree,
    /// One named edge from a tree to a file or subtree.
    Entry,
    /// A namespace snapshot plus lineage metadata.
    Commit,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
            Self::Entry => write!(f, "entry"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// contents of the data — it is a pure key-value store keyed by content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The kind of this record.
    pub kind: ObjectKind,
    /// The serialized bytes of the record.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID for this object.
    ///
    /// Uses the appropriate domain-separated hasher for each record kind.
    pub fn compute_id(&self) -> ObjectId {
        let hasher = match self.kind {
            ObjectKind::Blob => &ContentHasher::BLOB,
            ObjectKind::Tree => &ContentHasher::TREE,
            ObjectKind::Entry => &ContentHasher::ENTRY,
            ObjectKind::Commit => &ContentHasher::COMMIT,
        };
        hasher.hash(&self.data)
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    obj: &StoredObject,
    expected: ObjectKind,
) -> StoreResult<T> {
    if obj.kind != expected {
        return Err(StoreError::CorruptObject {
            id: obj.compute_id(),
            reason: format!("expected {expected}, got {}", obj.kind),
        });
    }
    serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn encode<T: Serialize>(value: &T, kind: ObjectKind) -> StoreResult<StoredObject> {
    let data = serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(StoredObject::new(kind, data))
}

// ---------------------------------------------------------------------------
// BlobRef
// ---------------------------------------------------------------------------

/// Reference to an externally-owned file payload.
///
/// The payload itself lives with the external file service; VHS never opens,
/// hashes, or deletes it — it only carries the stable identifier the service
/// supplied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    /// Identifier of the file payload, as issued by the blob identity provider.
    pub blob: ObjectId,
}

impl BlobRef {
    /// Create a new blob reference for an external payload id.
    pub fn new(blob: ObjectId) -> Self {
        Self { blob }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(self, ObjectKind::Blob)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(obj, ObjectKind::Blob)
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// What an entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// The entry targets a blob reference (a file).
    File,
    /// The entry targets a subtree (a collection).
    Tree,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// A single named edge in the namespace graph.
///
/// Entries are immutable once created: renaming or retargeting means creating
/// a new entry and relinking it into a freshly rebuilt parent tree. The name
/// is a single path segment, unique within the containing tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Kind of the target object.
    pub kind: EntryKind,
    /// Path segment (a single name, not a full path).
    pub name: String,
    /// Content-addressed id of the target record.
    pub target: ObjectId,
}

impl Entry {
    /// Create a new entry.
    pub fn new(kind: EntryKind, name: impl Into<String>, target: ObjectId) -> Self {
        Self {
            kind,
            name: name.into(),
            target,
        }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(self, ObjectKind::Entry)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(obj, ObjectKind::Entry)
    }

    /// The content-addressed id this entry will be stored under.
    pub fn id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Immutable collection of entry ids (a directory snapshot).
///
/// Once persisted, the entry-id list never changes; any conceptual edit
/// produces a brand-new tree. A tree may be referenced by any number of
/// entries and commits (structural sharing).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Sorted entry ids. Sorting makes the serialized form canonical, so the
    /// tree's content hash never depends on insertion order.
    pub entries: Vec<ObjectId>,
}

impl Tree {
    /// Create a new tree with the given entry ids.
    ///
    /// Entry ids are sorted for deterministic hashing.
    pub fn new(mut entries: Vec<ObjectId>) -> Self {
        entries.sort();
        entries.dedup();
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A copy of this tree with one entry id added.
    pub fn with_entry(&self, id: ObjectId) -> Self {
        let mut entries = self.entries.clone();
        entries.push(id);
        Self::new(entries)
    }

    /// A copy of this tree with one entry id removed.
    pub fn without_entry(&self, id: &ObjectId) -> Self {
        let entries = self
            .entries
            .iter()
            .copied()
            .filter(|e| e != id)
            .collect();
        Self { entries }
    }

    /// Returns `true` if the tree lists the given entry id.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.entries.binary_search(id).is_ok()
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(self, ObjectKind::Tree)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(obj, ObjectKind::Tree)
    }

    /// The content-addressed id this tree will be stored under.
    pub fn id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A point-in-time namespace snapshot.
///
/// The parent chain of any commit terminates at a genesis commit whose tree
/// has zero entries. Commits are never mutated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Root tree id of the snapshot.
    pub tree: ObjectId,
    /// Parent commit id; `None` only at genesis.
    pub parent: Option<ObjectId>,
    /// Human-readable change description.
    pub message: String,
    /// Wall-clock time the commit was built.
    pub timestamp: DateTime<Utc>,
}

impl Commit {
    /// Create a commit stamped with the current time.
    pub fn new(tree: ObjectId, parent: Option<ObjectId>, message: impl Into<String>) -> Self {
        Self {
            tree,
            parent,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Returns `true` if this is a parent-less genesis commit.
    pub fn is_genesis(&self) -> bool {
        self.parent.is_none()
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(self, ObjectKind::Commit)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(obj, ObjectKind::Commit)
    }

    /// The content-addressed id this commit will be stored under.
    pub fn id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }
}
