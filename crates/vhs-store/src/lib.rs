//! Content-addressed object repository for the Versioned Hierarchy Store.
//!
//! This crate implements the durable keyed storage layer of VHS: every
//! immutable record — blob references, trees, entries, commits — is stored
//! as an object identified by its BLAKE3 hash (domain-separated by record
//! kind). The store has no tree semantics: it is pure get/put.
//!
//! # Record Kinds
//!
//! - [`BlobRef`] — reference to an externally-owned file payload
//! - [`Tree`] — immutable, sorted list of entry ids
//! - [`Entry`] — one named edge from a tree to a file or subtree
//! - [`Commit`] — a namespace snapshot plus lineage metadata
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] — `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Records are immutable once written (content-addressing guarantees this).
//! 2. Concurrent reads are always safe (records are immutable).
//! 3. The store never interprets record payloads — it is a pure key-value store.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod hash;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use hash::ContentHasher;
pub use memory::InMemoryObjectStore;
pub use object::{BlobRef, Commit, Entry, EntryKind, ObjectKind, StoredObject, Tree};
pub use traits::ObjectStore;
