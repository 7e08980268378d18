//! High-level SDK for the Versioned Hierarchy Store.
//!
//! Ties the object store, the resolver/staging layer, and the ref store
//! together behind one API: bootstrap refs, stage mutations in sessions,
//! commit with compare-and-swap head advancement, and read any snapshot.
//! This is the main entry point for applications embedding VHS.

pub mod commit;
pub mod error;
pub mod repository;

pub use commit::{ChildEntry, CommitInfo, Resolved, Rev};
pub use error::{SdkError, SdkResult};
pub use repository::{History, Session, Vhs};

// Re-export key types
pub use vhs_refs::{Ref, RefStore};
pub use vhs_store::{Commit, Entry, EntryKind, ObjectStore, Tree};
pub use vhs_types::ObjectId;
