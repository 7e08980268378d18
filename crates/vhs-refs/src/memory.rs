//! In-memory reference store for testing and ephemeral use.
//!
//! [`InMemoryRefStore`] stores all refs in a `HashMap` protected by a
//! `RwLock`. It implements the full [`RefStore`] trait and is suitable for
//! unit tests, REPL sessions, and short-lived processes.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;
use vhs_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::Ref;

/// An in-memory implementation of [`RefStore`].
///
/// All data lives in a `HashMap` behind a `RwLock`. The compare-and-swap
/// holds the write lock across the compare and the swap, which serializes
/// advancement per ref. Data is lost when the store is dropped.
#[derive(Debug)]
pub struct InMemoryRefStore {
    refs: RwLock<HashMap<String, Ref>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self {
            refs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRefStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        let refs = self
            .refs
            .read()
            .map_err(|e| RefError::Io(std::io::Error::other(format!("lock poisoned: {e}"))))?;
        Ok(refs.get(name).cloned())
    }

    fn create_ref(&self, name: &str, head: ObjectId) -> Result<Ref> {
        validate_ref_name(name)?;

        let mut refs = self
            .refs
            .write()
            .map_err(|e| RefError::Io(std::io::Error::other(format!("lock poisoned: {e}"))))?;

        if refs.contains_key(name) {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let reference = Ref::new(name, head);
        refs.insert(name.to_string(), reference.clone());
        Ok(reference)
    }

    fn compare_and_swap(&self, name: &str, expected: &ObjectId, new: ObjectId) -> Result<Ref> {
        let mut refs = self
            .refs
            .write()
            .map_err(|e| RefError::Io(std::io::Error::other(format!("lock poisoned: {e}"))))?;

        let current = refs.get_mut(name).ok_or_else(|| RefError::NotFound {
            name: name.to_string(),
        })?;

        if current.head != *expected {
            return Err(RefError::ConcurrentModification {
                name: name.to_string(),
                expected: *expected,
                actual: current.head,
            });
        }

        current.head = new;
        debug!(name = %name, head = %new.short_hex(), "advanced ref");
        Ok(current.clone())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<Ref>> {
        let refs = self
            .refs
            .read()
            .map_err(|e| RefError::Io(std::io::Error::other(format!("lock poisoned: {e}"))))?;
        let mut result: Vec<Ref> = refs
            .values()
            .filter(|r| r.name.starts_with(prefix))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }
}
