use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vhs_store::{Commit, EntryKind};
use vhs_types::ObjectId;

/// A revision to read from: a named ref's current head, or a pinned commit.
///
/// Pinned commits are how callers hold a stable snapshot while the ref
/// advances underneath them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rev {
    /// The current head of a named ref, looked up at call time.
    Head(String),
    /// A specific commit id.
    Commit(ObjectId),
}

impl Rev {
    pub fn head(name: impl Into<String>) -> Self {
        Self::Head(name.into())
    }

    pub fn commit(id: ObjectId) -> Self {
        Self::Commit(id)
    }
}

/// A commit record together with its id, as returned to SDK callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: ObjectId,
    /// Root tree of the namespace snapshot this commit captures.
    pub tree: ObjectId,
    pub parent: Option<ObjectId>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl CommitInfo {
    pub(crate) fn from_commit(id: ObjectId, commit: &Commit) -> Self {
        Self {
            id,
            tree: commit.tree,
            parent: commit.parent,
            message: commit.message.clone(),
            timestamp: commit.timestamp,
        }
    }

    /// Whether this is the first commit of its lineage.
    pub fn is_genesis(&self) -> bool {
        self.parent.is_none()
    }
}

/// What a path resolved to inside a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolved {
    /// A file entry and the payload id it references.
    File {
        entry_id: ObjectId,
        name: String,
        blob: ObjectId,
    },
    /// A tree and its entry count. The empty path resolves to the root tree.
    Tree { tree_id: ObjectId, len: usize },
}

impl Resolved {
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree { .. })
    }
}

/// One child of a listed tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub entry_id: ObjectId,
    pub name: String,
    pub kind: EntryKind,
    /// Blob-ref id for files, subtree id for trees.
    pub target: ObjectId,
}
