use vhs_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Records are immutable once written. Content-addressing guarantees this:
///   the same data always produces the same ID.
/// - Concurrent reads are always safe (records are immutable).
/// - The store never interprets record payloads — it is a pure key-value store.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read a record by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the record does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write a record and return its content-addressed ID.
    ///
    /// If the record already exists, this is a no-op (idempotent).
    /// The returned ID is computed from the record's kind and data.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether a record exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read multiple records in a batch.
    ///
    /// Default implementation calls `read()` for each ID. Backends may
    /// override for better performance (e.g., fewer I/O round-trips).
    fn read_batch(&self, ids: &[ObjectId]) -> StoreResult<Vec<Option<StoredObject>>> {
        ids.iter().map(|id| self.read(id)).collect()
    }

    /// Write multiple records in a batch and return their IDs.
    ///
    /// A staging session persists its whole new lineage through this call at
    /// commit time, so abandoned sessions leave nothing behind. Backends may
    /// override for better performance (e.g., single fsync).
    fn write_batch(&self, objects: &[StoredObject]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.write(obj)).collect()
    }
}
