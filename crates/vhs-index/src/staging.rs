//! Copy-on-write staging sessions: the VHS mutation engine.
//!
//! A [`Staging`] session holds a mutable "current staged root" initialized
//! from a head commit's tree. Every call re-resolves against this current
//! root — never a stale snapshot — so two inserts issued in one session
//! compose correctly. Rebuilt trees and entries accumulate in an in-memory
//! pending overlay ([`StagedStore`]) and reach durable storage in one batch
//! at commit time; a session abandoned before commit has no observable side
//! effect.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;
use vhs_store::{BlobRef, Entry, EntryKind, ObjectStore, StoreResult, StoredObject, Tree};
use vhs_types::ObjectId;

use crate::error::{IndexError, IndexResult};
use crate::resolve::{ResolvedStep, Resolver};

/// What a staged insert links into the namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertTarget {
    /// Link a file payload already registered with the external file service.
    File(ObjectId),
    /// Create and link a fresh empty tree.
    ///
    /// Staged entries only ever reference trees created by their own
    /// session, never arbitrary pre-existing ones, so no entry can point at
    /// an ancestor and the namespace stays acyclic by construction.
    Dir,
}

/// One logical operation recorded by a staging session.
///
/// The op log lets the commit layer replay the session against a new head
/// after a ref conflict, re-resolving every path from scratch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagedOp {
    /// Insert a new entry under `path`.
    Insert {
        path: String,
        name: String,
        target: InsertTarget,
    },
    /// Replace the file entry at `path` with a new payload.
    Update { path: String, blob: ObjectId },
    /// Unlink the entry at `path`.
    Remove { path: String, force: bool },
}

/// Pending-overlay object store.
///
/// Reads fall through to the base store; writes accumulate in memory until
/// [`StagedStore::take_batch`] hands them over for a single durable flush.
/// Records the base already holds are not re-staged (content addressing
/// makes the write a no-op anyway).
pub struct StagedStore {
    base: Arc<dyn ObjectStore>,
    pending: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl StagedStore {
    /// Create an empty overlay over the given base store.
    pub fn new(base: Arc<dyn ObjectStore>) -> Self {
        Self {
            base,
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records staged but not yet flushed.
    pub fn pending_len(&self) -> usize {
        self.pending.read().expect("lock poisoned").len()
    }

    /// Drain the pending records, sorted by id for deterministic writes.
    pub fn take_batch(&self) -> Vec<StoredObject> {
        let mut map = self.pending.write().expect("lock poisoned");
        let mut batch: Vec<(ObjectId, StoredObject)> = map.drain().collect();
        batch.sort_by_key(|(id, _)| *id);
        batch.into_iter().map(|(_, obj)| obj).collect()
    }
}

impl ObjectStore for StagedStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        if let Some(obj) = self.pending.read().expect("lock poisoned").get(id) {
            return Ok(Some(obj.clone()));
        }
        self.base.read(id)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if self.base.exists(&id)? {
            return Ok(id);
        }
        self.pending
            .write()
            .expect("lock poisoned")
            .entry(id)
            .or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        if self.pending.read().expect("lock poisoned").contains_key(id) {
            return Ok(true);
        }
        self.base.exists(id)
    }
}

impl std::fmt::Debug for StagedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedStore")
            .field("pending", &self.pending_len())
            .finish()
    }
}

/// An in-progress, not-yet-committed namespace rebuild.
///
/// Produces a new root tree per mutation by copy-on-write reconstruction of
/// every ancestor from the mutation point to the root. Existing trees are
/// never touched; unrelated siblings and subtrees are referenced unchanged
/// by the new parents (structural sharing).
#[derive(Debug)]
pub struct Staging {
    store: StagedStore,
    base_head: ObjectId,
    root: ObjectId,
    ops: Vec<StagedOp>,
}

impl Staging {
    /// Open a session on top of `base`, rooted at a head commit's tree.
    pub fn new(base: Arc<dyn ObjectStore>, base_head: ObjectId, root: ObjectId) -> Self {
        Self {
            store: StagedStore::new(base),
            base_head,
            root,
            ops: Vec::new(),
        }
    }

    /// Rebuild a session from an op log against a (possibly different) head.
    ///
    /// Every op re-resolves its paths from scratch, so this is the conflict
    /// retry path: nothing from the failed attempt is reused.
    pub fn replay(
        base: Arc<dyn ObjectStore>,
        base_head: ObjectId,
        root: ObjectId,
        ops: &[StagedOp],
    ) -> IndexResult<Self> {
        let mut staging = Self::new(base, base_head, root);
        for op in ops {
            match op {
                StagedOp::Insert { path, name, target } => {
                    staging.insert(path, name, target.clone())?;
                }
                StagedOp::Update { path, blob } => {
                    staging.update(path, *blob)?;
                }
                StagedOp::Remove { path, force } => {
                    staging.remove(path, *force)?;
                }
            }
        }
        Ok(staging)
    }

    /// The current staged root tree id.
    pub fn root(&self) -> ObjectId {
        self.root
    }

    /// The head commit this session was opened against.
    pub fn base_head(&self) -> ObjectId {
        self.base_head
    }

    /// The operations recorded so far.
    pub fn ops(&self) -> &[StagedOp] {
        &self.ops
    }

    /// Read access to the staged state (pending overlay included).
    pub fn store(&self) -> &StagedStore {
        &self.store
    }

    /// Insert a new entry named `name` under the tree at `path`.
    ///
    /// Returns the new staged root. Fails with
    /// [`IndexError::NotATree`] when `path` names a file,
    /// [`IndexError::EntryExists`] when the name is already taken in the
    /// target tree.
    pub fn insert(&mut self, path: &str, name: &str, target: InsertTarget) -> IndexResult<ObjectId> {
        if name.is_empty() || name.contains('/') {
            return Err(IndexError::InvalidPath(format!(
                "entry name must be a single non-empty segment, got {name:?}"
            )));
        }

        let chain = Resolver::new(&self.store).resolve_path(self.root, path)?;
        let (leaf, ancestors) = match chain.split_last() {
            Some(parts) => parts,
            None => return Err(IndexError::InvalidPath("empty resolution chain".into())),
        };
        if let Some((_, entry)) = &leaf.entry {
            // The walk terminated on a file, not a tree.
            return Err(IndexError::NotATree(entry.name.clone()));
        }
        if Resolver::new(&self.store)
            .find_entry(&leaf.tree, name)?
            .is_some()
        {
            return Err(IndexError::EntryExists(name.to_string()));
        }

        let (kind, target_id) = match &target {
            InsertTarget::File(blob) => {
                let blob_ref = BlobRef::new(*blob);
                let id = self.store.write(&blob_ref.to_stored_object()?)?;
                (EntryKind::File, id)
            }
            InsertTarget::Dir => {
                let id = self.store.write(&Tree::empty().to_stored_object()?)?;
                (EntryKind::Tree, id)
            }
        };
        let entry = Entry::new(kind, name, target_id);
        let entry_id = self.store.write(&entry.to_stored_object()?)?;

        let new_leaf = leaf.tree.with_entry(entry_id);
        let child_id = self.store.write(&new_leaf.to_stored_object()?)?;
        let new_root = self.rebuild_ancestors(ancestors, child_id)?;

        self.root = new_root;
        self.ops.push(StagedOp::Insert {
            path: path.to_string(),
            name: name.to_string(),
            target,
        });
        debug!(path = %path, name = %name, root = %new_root.short_hex(), "staged insert");
        Ok(new_root)
    }

    /// Replace the file entry at `path` with a new payload id.
    ///
    /// The entry keeps its name; a new entry record replaces the old one in
    /// a freshly rebuilt parent tree.
    pub fn update(&mut self, path: &str, blob: ObjectId) -> IndexResult<ObjectId> {
        let chain = Resolver::new(&self.store).resolve_path(self.root, path)?;
        let (leaf, ancestors) = match chain.split_last() {
            Some(parts) => parts,
            None => return Err(IndexError::InvalidPath("empty resolution chain".into())),
        };
        let (old_id, old_entry) = match &leaf.entry {
            Some((id, entry)) if entry.kind == EntryKind::File => (id, entry),
            _ => {
                return Err(IndexError::InvalidPath(format!(
                    "update target {path:?} is not a file"
                )))
            }
        };

        let blob_ref = BlobRef::new(blob);
        let blob_rec_id = self.store.write(&blob_ref.to_stored_object()?)?;
        let replacement = Entry::new(EntryKind::File, old_entry.name.clone(), blob_rec_id);
        let replacement_id = self.store.write(&replacement.to_stored_object()?)?;

        let new_leaf = leaf.tree.without_entry(old_id).with_entry(replacement_id);
        let child_id = self.store.write(&new_leaf.to_stored_object()?)?;
        let new_root = self.rebuild_ancestors(ancestors, child_id)?;

        self.root = new_root;
        self.ops.push(StagedOp::Update {
            path: path.to_string(),
            blob,
        });
        debug!(path = %path, root = %new_root.short_hex(), "staged update");
        Ok(new_root)
    }

    /// Unlink the entry at `path`.
    ///
    /// Removing a populated tree requires `force` and merely detaches the
    /// subtree: its records stay in the store, unreachable from any live
    /// path. The namespace root itself cannot be removed.
    pub fn remove(&mut self, path: &str, force: bool) -> IndexResult<ObjectId> {
        if path.is_empty() {
            return Err(IndexError::InvalidPath(
                "the namespace root cannot be removed".into(),
            ));
        }

        let chain = Resolver::new(&self.store).resolve_path(self.root, path)?;
        // The deepest step carrying an entry holds the removal target; for a
        // tree path a trailing entry-less step holds the target tree itself.
        let last_has_entry = chain.last().is_some_and(|s| s.entry.is_some());
        let target_level = if last_has_entry {
            chain.len() - 1
        } else if chain.len() >= 2 {
            chain.len() - 2
        } else {
            return Err(IndexError::InvalidPath(format!(
                "no entry to remove at {path:?}"
            )));
        };

        let step = &chain[target_level];
        let (target_id, target_entry) = match &step.entry {
            Some(parts) => parts,
            None => {
                return Err(IndexError::InvalidPath(format!(
                    "no entry to remove at {path:?}"
                )))
            }
        };

        if target_entry.kind == EntryKind::Tree {
            let subtree = match chain.last() {
                Some(s) if s.entry.is_none() => s.tree.clone(),
                _ => Resolver::new(&self.store).load_tree(&target_entry.target)?,
            };
            if !subtree.is_empty() && !force {
                return Err(IndexError::NotEmpty(path.to_string()));
            }
        }

        let new_leaf = step.tree.without_entry(target_id);
        let child_id = self.store.write(&new_leaf.to_stored_object()?)?;
        let new_root = self.rebuild_ancestors(&chain[..target_level], child_id)?;

        self.root = new_root;
        self.ops.push(StagedOp::Remove {
            path: path.to_string(),
            force,
        });
        debug!(path = %path, force = force, root = %new_root.short_hex(), "staged remove");
        Ok(new_root)
    }

    /// Consume the session, yielding the final root and the pending records
    /// to persist in one batch.
    pub fn into_batch(self) -> (ObjectId, Vec<StoredObject>) {
        let batch = self.store.take_batch();
        (self.root, batch)
    }

    /// Rebuild every ancestor level above a mutated tree, leaf-to-root.
    ///
    /// Each ancestor gets a copy of its old entry-id list with the stale
    /// child entry swapped for a replacement of the same name pointing at
    /// the freshly built child tree. Sibling ids are carried over untouched.
    fn rebuild_ancestors(
        &self,
        ancestors: &[ResolvedStep],
        mut child_id: ObjectId,
    ) -> IndexResult<ObjectId> {
        for step in ancestors.iter().rev() {
            let (stale_id, stale_entry) = match &step.entry {
                Some(parts) => parts,
                None => {
                    return Err(IndexError::InvalidPath(
                        "ancestor step without a matched entry".into(),
                    ))
                }
            };
            let replacement = Entry::new(stale_entry.kind, stale_entry.name.clone(), child_id);
            let replacement_id = self.store.write(&replacement.to_stored_object()?)?;
            let rebuilt = step.tree.without_entry(stale_id).with_entry(replacement_id);
            child_id = self.store.write(&rebuilt.to_stored_object()?)?;
        }
        Ok(child_id)
    }
}
