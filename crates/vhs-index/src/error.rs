use thiserror::Error;
use vhs_store::StoreError;
use vhs_types::ObjectId;

/// Errors from path resolution and staging operations.
///
/// Everything here propagates to the caller unchanged; there is no silent
/// recovery at this layer.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A path segment did not name any entry in its tree.
    #[error("path not found: no entry named {0:?}")]
    PathNotFound(String),

    /// Resolution tried to descend through a file entry.
    #[error("not a tree: {0:?} is a file")]
    NotATree(String),

    /// Removal of a populated tree without `force`.
    #[error("tree at {0:?} is not empty (pass force to detach it)")]
    NotEmpty(String),

    /// Insertion of a segment name already present in the target tree.
    #[error("entry already exists: {0:?}")]
    EntryExists(String),

    /// The path or segment name is malformed for the requested operation.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// An entry points at an id the store does not hold.
    ///
    /// Integrity fault: storage corruption or a missed write. Fails closed,
    /// is logged, and is never silently skipped.
    #[error("dangling reference: {context} points at missing object {id}")]
    DanglingReference { id: ObjectId, context: String },

    /// Error from the underlying object store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
