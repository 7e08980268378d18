//! Path resolution and copy-on-write staging for the Versioned Hierarchy Store.
//!
//! This crate walks the immutable namespace (the [`Resolver`]) and rebuilds
//! it one change at a time (the [`Staging`] session, VHS's mutation engine).
//! A staging session never mutates an existing tree: every insert, update,
//! or removal reconstructs the trees on the direct path from the mutation
//! point up to the root, referencing all unrelated siblings unchanged.
//! Structural sharing is the core performance and correctness property of
//! the whole design.
//!
//! # Key Types
//!
//! - [`Resolver`] — multi-segment path walking over any object store
//! - [`ResolvedStep`] — one level of a root-to-leaf resolution chain
//! - [`Staging`] — an in-progress, not-yet-committed rebuild
//! - [`StagedStore`] — pending-overlay store; nothing durable leaks from an
//!   abandoned session
//! - [`StagedOp`] — the session's op log, replayable after a head conflict

pub mod error;
pub mod resolve;
pub mod staging;

pub use error::{IndexError, IndexResult};
pub use resolve::{ResolvedStep, Resolver};
pub use staging::{InsertTarget, StagedOp, StagedStore, Staging};
