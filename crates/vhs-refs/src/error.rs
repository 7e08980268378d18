//! Error types for reference operations.

use thiserror::Error;
use vhs_types::ObjectId;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// A reference with this name already exists.
    #[error("ref already exists: {name}")]
    AlreadyExists { name: String },

    /// The ref's head moved between resolution and advancement.
    ///
    /// Transient: the caller must re-resolve against `actual` and re-run the
    /// whole staging sequence.
    #[error("concurrent modification of ref {name}: expected head {expected}, found {actual}")]
    ConcurrentModification {
        name: String,
        expected: ObjectId,
        actual: ObjectId,
    },

    /// The ref name is invalid.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
