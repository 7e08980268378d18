use std::collections::HashMap;
use std::sync::RwLock;

use vhs_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All records are held in memory behind a
/// `RwLock` for safe concurrent access. Records are cloned on read/write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored records.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|obj| obj.size)
            .sum()
    }

    /// Remove all records from the store.
    pub fn clear(&self) {
        self.objects.write().expect("lock poisoned").clear();
    }

    /// Return a sorted list of all record IDs in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.objects.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let mut map = self.objects.write().expect("lock poisoned");
        // Idempotent: if already present, skip (content-addressing guarantees
        // the same ID always maps to the same content).
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::*;

    fn make_blob(seed: &[u8]) -> StoredObject {
        BlobRef::new(ObjectId::from_bytes(seed))
            .to_stored_object()
            .unwrap()
    }

    fn make_tree() -> StoredObject {
        let tree = Tree::new(vec![
            ObjectId::from_bytes(b"hello.txt"),
            ObjectId::from_bytes(b"subdir"),
        ]);
        tree.to_stored_object().unwrap()
    }

    fn make_commit() -> StoredObject {
        Commit::new(ObjectId::from_bytes(b"root"), None, "genesis")
            .to_stored_object()
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn write_and_read_blob_ref() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"hello world");
        let id = store.write(&obj).unwrap();
        assert!(!id.is_null());

        let read_back = store.read(&id).unwrap().expect("should exist");
        assert_eq!(read_back, obj);
    }

    #[test]
    fn write_and_read_tree() {
        let store = InMemoryObjectStore::new();
        let obj = make_tree();
        let id = store.write(&obj).unwrap();

        let read_back = store.read(&id).unwrap().expect("should exist");
        assert_eq!(read_back.kind, ObjectKind::Tree);

        let tree = Tree::from_stored_object(&read_back).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn write_and_read_commit() {
        let store = InMemoryObjectStore::new();
        let obj = make_commit();
        let id = store.write(&obj).unwrap();

        let read_back = store.read(&id).unwrap().expect("should exist");
        let decoded = Commit::from_stored_object(&read_back).unwrap();
        assert!(decoded.is_genesis());
        assert_eq!(decoded.message, "genesis");
    }

    // -----------------------------------------------------------------------
    // Content-addressing correctness
    // -----------------------------------------------------------------------

    #[test]
    fn same_content_produces_same_id() {
        let store = InMemoryObjectStore::new();
        let obj1 = make_blob(b"identical content");
        let obj2 = make_blob(b"identical content");
        let id1 = store.write(&obj1).unwrap();
        let id2 = store.write(&obj2).unwrap();
        assert_eq!(id1, id2);
        // Only one record stored (dedup)
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn different_content_produces_different_ids() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"aaa")).unwrap();
        let id2 = store.write(&make_blob(b"bbb")).unwrap();
        assert_ne!(id1, id2);
        assert_eq!(store.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Exists / missing reads
    // -----------------------------------------------------------------------

    #[test]
    fn exists_for_missing_object() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"nonexistent");
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn exists_for_present_object() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&make_blob(b"present")).unwrap();
        assert!(store.exists(&id).unwrap());
    }

    #[test]
    fn read_missing_object_returns_none() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"missing");
        assert!(store.read(&id).unwrap().is_none());
    }

    // -----------------------------------------------------------------------
    // Batch operations
    // -----------------------------------------------------------------------

    #[test]
    fn write_batch_and_read_batch() {
        let store = InMemoryObjectStore::new();
        let objects = vec![
            make_blob(b"batch-1"),
            make_blob(b"batch-2"),
            make_blob(b"batch-3"),
        ];
        let ids = store.write_batch(&objects).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(store.len(), 3);

        let read_back = store.read_batch(&ids).unwrap();
        assert_eq!(read_back.len(), 3);
        for (i, maybe_obj) in read_back.into_iter().enumerate() {
            let obj = maybe_obj.expect("batch object should exist");
            assert_eq!(obj, objects[i]);
        }
    }

    #[test]
    fn read_batch_with_missing() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"exists")).unwrap();
        let id2 = ObjectId::from_bytes(b"missing");

        let results = store.read_batch(&[id1, id2]).unwrap();
        assert!(results[0].is_some());
        assert!(results[1].is_none());
    }

    // -----------------------------------------------------------------------
    // Write idempotency
    // -----------------------------------------------------------------------

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"idempotent");
        let id1 = store.write(&obj).unwrap();
        let id2 = store.write(&obj).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn len_and_is_empty() {
        let store = InMemoryObjectStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);

        store.write(&make_blob(b"a")).unwrap();
        assert!(!store.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_removes_all() {
        let store = InMemoryObjectStore::new();
        store.write(&make_blob(b"a")).unwrap();
        store.write(&make_blob(b"b")).unwrap();
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn all_ids_is_sorted() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"aaa")).unwrap();
        let id2 = store.write(&make_blob(b"bbb")).unwrap();

        let ids = store.all_ids();
        assert_eq!(ids.len(), 2);
        for w in ids.windows(2) {
            assert!(w[0] <= w[1]);
        }
        assert!(ids.contains(&id1));
        assert!(ids.contains(&id2));
    }

    // -----------------------------------------------------------------------
    // Concurrent read safety
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        let obj = make_blob(b"shared data");
        let id = store.write(&obj).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let expected_id = id;
                thread::spawn(move || {
                    let result = store.read(&expected_id).unwrap();
                    assert!(result.is_some());
                    let read_obj = result.unwrap();
                    assert_eq!(read_obj.compute_id(), expected_id);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    // -----------------------------------------------------------------------
    // Hash verification on read
    // -----------------------------------------------------------------------

    #[test]
    fn stored_object_hash_matches_id() {
        let store = InMemoryObjectStore::new();
        let obj = make_tree();
        let id = store.write(&obj).unwrap();
        let read_back = store.read(&id).unwrap().unwrap();
        assert_eq!(read_back.compute_id(), id);
    }

    #[test]
    fn default_creates_empty_store() {
        let store = InMemoryObjectStore::default();
        assert!(store.is_empty());
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::new();
        store.write(&make_blob(b"x")).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryObjectStore"));
        assert!(debug.contains("object_count"));
    }
}
