//! Reference management for the Versioned Hierarchy Store.
//!
//! A ref is a named mutable pointer to a head commit — the only mutable
//! state anywhere in the VHS model. Everything else (trees, entries,
//! commits) is immutable and content-addressed; "changing" the namespace
//! means building a new snapshot and swinging a ref to it.
//!
//! # Architecture
//!
//! - Refs advance exclusively through compare-and-swap: the caller names the
//!   head it built against, and the swap fails if someone else advanced the
//!   ref in the meantime. Stale-head reuse is forbidden; the caller must
//!   re-resolve against the new head and retry.
//! - Refs are independent of one another. No cross-ref coordination exists
//!   or is needed.
//!
//! # Modules
//!
//! - [`error`] — Error types for ref operations
//! - [`types`] — The [`Ref`] record
//! - [`traits`] — The [`RefStore`] trait defining the storage interface
//! - [`names`] — Ref name validation
//! - [`memory`] — In-memory [`InMemoryRefStore`] for tests

pub mod error;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use memory::InMemoryRefStore;
pub use names::validate_ref_name;
pub use traits::RefStore;
pub use types::Ref;
