//! Multi-segment path resolution over the immutable namespace.
//!
//! Given a root tree and a slash-delimited path, the [`Resolver`] walks
//! named entries level by level and returns the full root-to-leaf chain
//! visited, so the mutation engine knows exactly which trees to rebuild.

use tracing::warn;
use vhs_store::{BlobRef, Commit, Entry, EntryKind, ObjectStore, StoredObject, Tree};
use vhs_types::ObjectId;

use crate::error::{IndexError, IndexResult};

/// One level of a resolution chain: the tree visited at that level and the
/// entry matched inside it (`None` when the walk ended on the tree itself).
#[derive(Clone, Debug)]
pub struct ResolvedStep {
    /// Id of the tree visited at this level.
    pub tree_id: ObjectId,
    /// The tree itself.
    pub tree: Tree,
    /// The entry matched in this tree, with its record id.
    pub entry: Option<(ObjectId, Entry)>,
}

/// Path walker over any [`ObjectStore`], including a staging overlay.
pub struct Resolver<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> Resolver<'a> {
    /// Create a resolver reading from the given store.
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Read a record that an entry or commit claims exists.
    ///
    /// An absent id here is an integrity fault (corruption or a missed
    /// write), not a user error: it is logged and fails closed.
    fn read_required(&self, id: &ObjectId, context: &str) -> IndexResult<StoredObject> {
        match self.store.read(id)? {
            Some(obj) => Ok(obj),
            None => {
                warn!(id = %id, context = %context, "dangling reference");
                Err(IndexError::DanglingReference {
                    id: *id,
                    context: context.to_string(),
                })
            }
        }
    }

    /// Load a tree record by id.
    pub fn load_tree(&self, id: &ObjectId) -> IndexResult<Tree> {
        let obj = self.read_required(id, "tree lookup")?;
        Ok(Tree::from_stored_object(&obj)?)
    }

    /// Load an entry record by id.
    pub fn load_entry(&self, id: &ObjectId) -> IndexResult<Entry> {
        let obj = self.read_required(id, "entry lookup")?;
        Ok(Entry::from_stored_object(&obj)?)
    }

    /// Load a commit record by id.
    pub fn load_commit(&self, id: &ObjectId) -> IndexResult<Commit> {
        let obj = self.read_required(id, "commit lookup")?;
        Ok(Commit::from_stored_object(&obj)?)
    }

    /// Load a blob-reference record by id.
    pub fn load_blob_ref(&self, id: &ObjectId) -> IndexResult<BlobRef> {
        let obj = self.read_required(id, "blob-ref lookup")?;
        Ok(BlobRef::from_stored_object(&obj)?)
    }

    /// Find the entry named `name` in `tree`, if any.
    pub fn find_entry(&self, tree: &Tree, name: &str) -> IndexResult<Option<(ObjectId, Entry)>> {
        for entry_id in &tree.entries {
            let entry = self.load_entry(entry_id)?;
            if entry.name == name {
                return Ok(Some((*entry_id, entry)));
            }
        }
        Ok(None)
    }

    /// Load every entry of `tree`, sorted by name.
    pub fn load_entries(&self, tree: &Tree) -> IndexResult<Vec<(ObjectId, Entry)>> {
        let mut entries = Vec::with_capacity(tree.len());
        for entry_id in &tree.entries {
            entries.push((*entry_id, self.load_entry(entry_id)?));
        }
        entries.sort_by(|(_, a), (_, b)| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Resolve a slash-delimited path against a root tree.
    ///
    /// Returns the full root-to-leaf chain visited. The empty path resolves
    /// to `[(root, None)]`. A chain ends either on a tree (terminal step has
    /// no entry) or on a file (terminal step carries the file entry).
    ///
    /// Errors: [`IndexError::PathNotFound`] for a missing segment,
    /// [`IndexError::NotATree`] when descending through a file,
    /// [`IndexError::DanglingReference`] when an entry's target is absent.
    pub fn resolve_path(&self, root: ObjectId, path: &str) -> IndexResult<Vec<ResolvedStep>> {
        let mut tree_id = root;
        let mut tree = self.load_tree(&root)?;
        let mut chain = Vec::new();

        if path.is_empty() {
            chain.push(ResolvedStep {
                tree_id,
                tree,
                entry: None,
            });
            return Ok(chain);
        }

        let segments: Vec<&str> = path.split('/').collect();
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(IndexError::InvalidPath(format!(
                    "empty segment in path {path:?}"
                )));
            }
            let (entry_id, entry) = self
                .find_entry(&tree, segment)?
                .ok_or_else(|| IndexError::PathNotFound(segment.to_string()))?;
            let is_last = i + 1 == segments.len();

            match entry.kind {
                EntryKind::File => {
                    if !is_last {
                        return Err(IndexError::NotATree(segment.to_string()));
                    }
                    chain.push(ResolvedStep {
                        tree_id,
                        tree,
                        entry: Some((entry_id, entry)),
                    });
                    return Ok(chain);
                }
                EntryKind::Tree => {
                    let child_id = entry.target;
                    let child = self.load_tree(&child_id)?;
                    chain.push(ResolvedStep {
                        tree_id,
                        tree,
                        entry: Some((entry_id, entry)),
                    });
                    tree_id = child_id;
                    tree = child;
                }
            }
        }

        // Every segment matched a tree: the walk ends on the final tree.
        chain.push(ResolvedStep {
            tree_id,
            tree,
            entry: None,
        });
        Ok(chain)
    }

    /// Resolve a path to its terminal entry only.
    ///
    /// Fails with [`IndexError::InvalidPath`] on the empty path, which has
    /// no entry (it names the root tree itself).
    pub fn resolve_entry(&self, root: ObjectId, path: &str) -> IndexResult<(ObjectId, Entry)> {
        if path.is_empty() {
            return Err(IndexError::InvalidPath(
                "the empty path names the root tree, not an entry".into(),
            ));
        }
        let chain = self.resolve_path(root, path)?;
        // The deepest step carrying an entry holds the terminal entry: the
        // last step for a file path, the second-to-last for a tree path.
        chain
            .into_iter()
            .rev()
            .find_map(|step| step.entry)
            .ok_or_else(|| IndexError::PathNotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vhs_store::InMemoryObjectStore;

    /// Write a file entry (blob-ref + entry) and return the entry id.
    fn put_file(store: &InMemoryObjectStore, name: &str, payload: &[u8]) -> ObjectId {
        let blob = BlobRef::new(ObjectId::from_bytes(payload));
        let blob_id = store.write(&blob.to_stored_object().unwrap()).unwrap();
        let entry = Entry::new(EntryKind::File, name, blob_id);
        store.write(&entry.to_stored_object().unwrap()).unwrap()
    }

    /// Write a tree and a tree entry pointing at it; returns the entry id.
    fn put_subtree(store: &InMemoryObjectStore, name: &str, entries: Vec<ObjectId>) -> ObjectId {
        let tree = Tree::new(entries);
        let tree_id = store.write(&tree.to_stored_object().unwrap()).unwrap();
        let entry = Entry::new(EntryKind::Tree, name, tree_id);
        store.write(&entry.to_stored_object().unwrap()).unwrap()
    }

    fn put_tree(store: &InMemoryObjectStore, entries: Vec<ObjectId>) -> ObjectId {
        store
            .write(&Tree::new(entries).to_stored_object().unwrap())
            .unwrap()
    }

    /// Build:  root/ { readme.txt, docs/ { guide.txt } }
    fn sample_namespace(store: &InMemoryObjectStore) -> ObjectId {
        let readme = put_file(store, "readme.txt", b"readme payload");
        let guide = put_file(store, "guide.txt", b"guide payload");
        let docs = put_subtree(store, "docs", vec![guide]);
        put_tree(store, vec![readme, docs])
    }

    #[test]
    fn empty_path_resolves_to_root() {
        let store = InMemoryObjectStore::new();
        let root = sample_namespace(&store);
        let resolver = Resolver::new(&store);

        let chain = resolver.resolve_path(root, "").unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].tree_id, root);
        assert!(chain[0].entry.is_none());
    }

    #[test]
    fn resolve_file_at_root() {
        let store = InMemoryObjectStore::new();
        let root = sample_namespace(&store);
        let resolver = Resolver::new(&store);

        let chain = resolver.resolve_path(root, "readme.txt").unwrap();
        assert_eq!(chain.len(), 1);
        let (_, entry) = chain[0].entry.as_ref().unwrap();
        assert_eq!(entry.name, "readme.txt");
        assert_eq!(entry.kind, EntryKind::File);
    }

    #[test]
    fn resolve_nested_file() {
        let store = InMemoryObjectStore::new();
        let root = sample_namespace(&store);
        let resolver = Resolver::new(&store);

        let chain = resolver.resolve_path(root, "docs/guide.txt").unwrap();
        assert_eq!(chain.len(), 2);
        // Root level matched "docs".
        let (_, docs_entry) = chain[0].entry.as_ref().unwrap();
        assert_eq!(docs_entry.name, "docs");
        assert_eq!(docs_entry.kind, EntryKind::Tree);
        // Leaf level matched the file.
        let (_, file_entry) = chain[1].entry.as_ref().unwrap();
        assert_eq!(file_entry.name, "guide.txt");
    }

    #[test]
    fn resolve_tree_path_ends_without_entry() {
        let store = InMemoryObjectStore::new();
        let root = sample_namespace(&store);
        let resolver = Resolver::new(&store);

        let chain = resolver.resolve_path(root, "docs").unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain[0].entry.is_some());
        assert!(chain[1].entry.is_none());
        assert_eq!(chain[1].tree.len(), 1);
    }

    #[test]
    fn missing_segment_fails_path_not_found() {
        let store = InMemoryObjectStore::new();
        let root = sample_namespace(&store);
        let resolver = Resolver::new(&store);

        let err = resolver.resolve_path(root, "docs/nope.txt").unwrap_err();
        assert!(matches!(err, IndexError::PathNotFound(s) if s == "nope.txt"));
    }

    #[test]
    fn descending_through_file_fails_not_a_tree() {
        let store = InMemoryObjectStore::new();
        let root = sample_namespace(&store);
        let resolver = Resolver::new(&store);

        let err = resolver
            .resolve_path(root, "readme.txt/deeper")
            .unwrap_err();
        assert!(matches!(err, IndexError::NotATree(s) if s == "readme.txt"));
    }

    #[test]
    fn empty_segment_is_invalid() {
        let store = InMemoryObjectStore::new();
        let root = sample_namespace(&store);
        let resolver = Resolver::new(&store);

        let err = resolver.resolve_path(root, "docs//guide.txt").unwrap_err();
        assert!(matches!(err, IndexError::InvalidPath(_)));
    }

    #[test]
    fn dangling_tree_reference_fails_closed() {
        let store = InMemoryObjectStore::new();
        // Entry claims a subtree that was never written.
        let ghost = Entry::new(EntryKind::Tree, "ghost", ObjectId::from_bytes(b"absent"));
        let ghost_id = store.write(&ghost.to_stored_object().unwrap()).unwrap();
        let root = put_tree(&store, vec![ghost_id]);
        let resolver = Resolver::new(&store);

        let err = resolver.resolve_path(root, "ghost").unwrap_err();
        assert!(matches!(err, IndexError::DanglingReference { .. }));
    }

    #[test]
    fn resolve_entry_returns_terminal_entry() {
        let store = InMemoryObjectStore::new();
        let root = sample_namespace(&store);
        let resolver = Resolver::new(&store);

        let (_, entry) = resolver.resolve_entry(root, "docs/guide.txt").unwrap();
        assert_eq!(entry.name, "guide.txt");

        // A tree path resolves to the entry naming the tree.
        let (_, docs) = resolver.resolve_entry(root, "docs").unwrap();
        assert_eq!(docs.kind, EntryKind::Tree);
    }

    #[test]
    fn resolve_entry_rejects_empty_path() {
        let store = InMemoryObjectStore::new();
        let root = sample_namespace(&store);
        let resolver = Resolver::new(&store);

        let err = resolver.resolve_entry(root, "").unwrap_err();
        assert!(matches!(err, IndexError::InvalidPath(_)));
    }

    #[test]
    fn load_entries_sorted_by_name() {
        let store = InMemoryObjectStore::new();
        let b = put_file(&store, "banana", b"b");
        let a = put_file(&store, "apple", b"a");
        let c = put_file(&store, "cherry", b"c");
        let root = put_tree(&store, vec![b, a, c]);
        let resolver = Resolver::new(&store);

        let tree = resolver.load_tree(&root).unwrap();
        let entries = resolver.load_entries(&tree).unwrap();
        let names: Vec<&str> = entries.iter().map(|(_, e)| e.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "banana", "cherry"]);
    }
}
