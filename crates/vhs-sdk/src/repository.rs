use std::sync::Arc;

use tracing::{debug, warn};
use vhs_index::{InsertTarget, Resolver, Staging};
use vhs_refs::{validate_ref_name, Ref, RefError, RefStore};
use vhs_store::{Commit, EntryKind, ObjectStore, Tree};
use vhs_types::ObjectId;

use crate::commit::{ChildEntry, CommitInfo, Resolved, Rev};
use crate::error::{SdkError, SdkResult};

/// How many times a commit re-resolves and replays its op log after losing
/// a head race before giving up.
const MAX_COMMIT_ATTEMPTS: usize = 3;

/// High-level VHS repository API.
///
/// Ties an object store and a ref store together behind the full workflow:
/// bootstrap a ref, stage mutations in a [`Session`], commit them with
/// compare-and-swap advancement, and read any snapshot — current head or
/// pinned commit — without ever blocking writers.
///
/// Both backends are injected; nothing in the SDK assumes a particular
/// storage implementation.
pub struct Vhs {
    objects: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
}

/// An open staging session bound to the ref it was started from.
///
/// All mutations are buffered; nothing reaches durable storage or the ref
/// until [`Vhs::commit`]. Dropping a session discards it without a trace.
pub struct Session {
    ref_name: String,
    staging: Staging,
}

impl Session {
    /// The ref this session was opened against.
    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }

    /// The current staged root tree id.
    pub fn root(&self) -> ObjectId {
        self.staging.root()
    }

    /// Whether any operations have been staged.
    pub fn is_dirty(&self) -> bool {
        !self.staging.ops().is_empty()
    }

    /// Stage a new file entry named `name` under the tree at `path`,
    /// referencing an externally stored payload.
    pub fn insert_file(&mut self, path: &str, name: &str, blob: ObjectId) -> SdkResult<ObjectId> {
        Ok(self.staging.insert(path, name, InsertTarget::File(blob))?)
    }

    /// Stage a new empty subtree named `name` under the tree at `path`.
    pub fn insert_dir(&mut self, path: &str, name: &str) -> SdkResult<ObjectId> {
        Ok(self.staging.insert(path, name, InsertTarget::Dir)?)
    }

    /// Stage a payload replacement for the file at `path`.
    pub fn update_file(&mut self, path: &str, blob: ObjectId) -> SdkResult<ObjectId> {
        Ok(self.staging.update(path, blob)?)
    }

    /// Stage removal of the entry at `path`.
    ///
    /// A populated subtree is only detached when `force` is set.
    pub fn remove(&mut self, path: &str, force: bool) -> SdkResult<ObjectId> {
        Ok(self.staging.remove(path, force)?)
    }

    /// Resolve a path against the staged (uncommitted) state.
    pub fn resolve(&self, path: &str) -> SdkResult<Resolved> {
        resolve_in(self.staging.store(), self.staging.root(), path)
    }
}

impl Vhs {
    /// Open a repository over the given backends.
    pub fn new(objects: Arc<dyn ObjectStore>, refs: Arc<dyn RefStore>) -> Self {
        Self { objects, refs }
    }

    /// Open a repository backed entirely by memory. Useful for tests and
    /// ephemeral workloads.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(vhs_store::InMemoryObjectStore::new()),
            Arc::new(vhs_refs::InMemoryRefStore::new()),
        )
    }

    /// The underlying object store.
    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    /// The underlying ref store.
    pub fn refs(&self) -> &Arc<dyn RefStore> {
        &self.refs
    }

    // ---- Ref lifecycle ----

    /// Bootstrap a new lineage: an empty root tree, a genesis commit, and a
    /// ref pointing at it.
    ///
    /// Fails if the name is invalid or already taken.
    pub fn init_ref(&self, name: &str) -> SdkResult<Ref> {
        validate_ref_name(name)?;
        let root = self.objects.write(&Tree::empty().to_stored_object()?)?;
        let genesis = Commit::new(root, None, format!("initialize {name}"));
        let head = self.objects.write(&genesis.to_stored_object()?)?;
        let r = self.refs.create_ref(name, head)?;
        debug!(name = %name, head = %head.short_hex(), "initialized ref");
        Ok(r)
    }

    /// Read an existing ref.
    pub fn open_ref(&self, name: &str) -> SdkResult<Ref> {
        match self.refs.read_ref(name)? {
            Some(r) => Ok(r),
            None => Err(RefError::NotFound {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// List refs by name prefix (pass `""` for all), sorted by name.
    pub fn list_refs(&self, prefix: &str) -> SdkResult<Vec<Ref>> {
        Ok(self.refs.list_refs(prefix)?)
    }

    // ---- Staging and commit ----

    /// Open a staging session against a ref's current head.
    pub fn begin(&self, ref_name: &str) -> SdkResult<Session> {
        let r = self.open_ref(ref_name)?;
        let head = self.read_commit(&r.head)?;
        Ok(Session {
            ref_name: ref_name.to_string(),
            staging: Staging::new(Arc::clone(&self.objects), r.head, head.tree),
        })
    }

    /// Persist a session's staged state as a new commit and advance its ref.
    ///
    /// The new lineage is flushed to the object store in one batch, then the
    /// ref is advanced by compare-and-swap from the head the session was
    /// built against. If another writer advanced the ref first, the whole op
    /// log is replayed against the new head — every path re-resolved from
    /// scratch — up to [`MAX_COMMIT_ATTEMPTS`] times. A replay can surface
    /// the same errors staging can (the other writer may have removed a
    /// parent tree or taken a name); those propagate to the caller.
    pub fn commit(&self, session: Session, message: &str) -> SdkResult<CommitInfo> {
        let Session { ref_name, staging } = session;
        if staging.ops().is_empty() {
            return Err(SdkError::NothingStaged(ref_name));
        }

        let ops = staging.ops().to_vec();
        let mut current = staging;
        let mut attempt = 1;
        loop {
            let expected = current.base_head();
            let (root, batch) = current.into_batch();
            self.objects.write_batch(&batch)?;
            let commit = Commit::new(root, Some(expected), message);
            let commit_id = self.objects.write(&commit.to_stored_object()?)?;

            match self.refs.compare_and_swap(&ref_name, &expected, commit_id) {
                Ok(_) => {
                    debug!(
                        name = %ref_name,
                        commit = %commit_id.short_hex(),
                        ops = ops.len(),
                        "committed"
                    );
                    return Ok(CommitInfo::from_commit(commit_id, &commit));
                }
                Err(RefError::ConcurrentModification { actual, .. }) => {
                    if attempt >= MAX_COMMIT_ATTEMPTS {
                        return Err(SdkError::CommitContention {
                            name: ref_name,
                            attempts: attempt,
                        });
                    }
                    warn!(
                        name = %ref_name,
                        attempt = attempt,
                        head = %actual.short_hex(),
                        "head moved during commit, replaying staged ops"
                    );
                    let head = self.read_commit(&actual)?;
                    current = Staging::replay(Arc::clone(&self.objects), actual, head.tree, &ops)?;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // ---- Reads ----

    /// Resolve a path inside the snapshot a revision names.
    ///
    /// The empty path resolves to the snapshot's root tree.
    pub fn resolve(&self, rev: &Rev, path: &str) -> SdkResult<Resolved> {
        let (_, commit) = self.rev_commit(rev)?;
        resolve_in(self.objects.as_ref(), commit.tree, path)
    }

    /// List the children of the tree at `path`, sorted by name.
    pub fn list_children(&self, rev: &Rev, path: &str) -> SdkResult<Vec<ChildEntry>> {
        let (_, commit) = self.rev_commit(rev)?;
        let resolver = Resolver::new(self.objects.as_ref());
        let chain = resolver.resolve_path(commit.tree, path)?;

        let tree = match chain.last() {
            Some(step) if step.entry.is_none() => &step.tree,
            Some(step) => {
                let name = step
                    .entry
                    .as_ref()
                    .map(|(_, e)| e.name.clone())
                    .unwrap_or_default();
                return Err(vhs_index::IndexError::NotATree(name).into());
            }
            None => return Err(vhs_index::IndexError::PathNotFound(path.to_string()).into()),
        };

        let entries = resolver.load_entries(tree)?;
        Ok(entries
            .into_iter()
            .map(|(entry_id, entry)| ChildEntry {
                entry_id,
                name: entry.name,
                kind: entry.kind,
                target: entry.target,
            })
            .collect())
    }

    /// Walk a revision's commit lineage, newest first, ending at genesis.
    ///
    /// Commits are loaded lazily, one per iteration step.
    pub fn history(&self, rev: &Rev) -> SdkResult<History<'_>> {
        let (id, _) = self.rev_commit(rev)?;
        Ok(History {
            objects: self.objects.as_ref(),
            next: Some(id),
        })
    }

    /// Load the commit a revision names.
    pub fn commit_info(&self, rev: &Rev) -> SdkResult<CommitInfo> {
        let (id, commit) = self.rev_commit(rev)?;
        Ok(CommitInfo::from_commit(id, &commit))
    }

    fn rev_commit(&self, rev: &Rev) -> SdkResult<(ObjectId, Commit)> {
        let id = match rev {
            Rev::Head(name) => self.open_ref(name)?.head,
            Rev::Commit(id) => *id,
        };
        let commit = self.read_commit(&id)?;
        Ok((id, commit))
    }

    fn read_commit(&self, id: &ObjectId) -> SdkResult<Commit> {
        Ok(Resolver::new(self.objects.as_ref()).load_commit(id)?)
    }
}

/// Lazy parent-chain iterator over commits.
///
/// Yields `Err` and then stops if a commit record is missing or corrupt.
pub struct History<'a> {
    objects: &'a dyn ObjectStore,
    next: Option<ObjectId>,
}

impl Iterator for History<'_> {
    type Item = SdkResult<CommitInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match Resolver::new(self.objects).load_commit(&id) {
            Ok(commit) => {
                self.next = commit.parent;
                Some(Ok(CommitInfo::from_commit(id, &commit)))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

fn resolve_in(store: &dyn ObjectStore, root: ObjectId, path: &str) -> SdkResult<Resolved> {
    let resolver = Resolver::new(store);
    if path.is_empty() {
        let tree = resolver.load_tree(&root)?;
        return Ok(Resolved::Tree {
            tree_id: root,
            len: tree.len(),
        });
    }
    let (entry_id, entry) = resolver.resolve_entry(root, path)?;
    match entry.kind {
        EntryKind::File => {
            let blob_ref = resolver.load_blob_ref(&entry.target)?;
            Ok(Resolved::File {
                entry_id,
                name: entry.name,
                blob: blob_ref.blob,
            })
        }
        EntryKind::Tree => {
            let tree = resolver.load_tree(&entry.target)?;
            Ok(Resolved::Tree {
                tree_id: entry.target,
                len: tree.len(),
            })
        }
    }
}
