//! The [`RefStore`] trait defining the reference storage interface.
//!
//! Any backend (in-memory, filesystem, database) implements this trait to
//! provide named head pointers for the Versioned Hierarchy Store.

use vhs_types::ObjectId;

use crate::error::Result;
use crate::types::Ref;

/// Storage backend for named head pointers.
///
/// Implementations must be thread-safe (`Send + Sync`). Advancement is
/// compare-and-swap only: the compare and the swap must be atomic with
/// respect to other writers of the same ref. Refs are independent; the
/// store never coordinates across names.
pub trait RefStore: Send + Sync {
    /// Read a ref by name.
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> Result<Option<Ref>>;

    /// Create a ref bound to an initial head commit.
    ///
    /// Used exactly once per name, at genesis bootstrap. Fails with
    /// [`RefError::AlreadyExists`](crate::RefError::AlreadyExists) if the
    /// name is taken.
    fn create_ref(&self, name: &str, head: ObjectId) -> Result<Ref>;

    /// Atomically advance a ref's head from `expected` to `new`.
    ///
    /// Fails with [`RefError::ConcurrentModification`](crate::RefError::ConcurrentModification)
    /// if the current head is no longer `expected` — the caller must then
    /// re-resolve against the actual head and re-run its staging sequence.
    fn compare_and_swap(&self, name: &str, expected: &ObjectId, new: ObjectId) -> Result<Ref>;

    /// List all refs whose name starts with `prefix`, sorted by name.
    ///
    /// Pass `""` to list all refs.
    fn list_refs(&self, prefix: &str) -> Result<Vec<Ref>>;
}
