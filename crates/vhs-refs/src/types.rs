//! The [`Ref`] record: a named pointer to a head commit.

use serde::{Deserialize, Serialize};
use vhs_types::ObjectId;

/// A named mutable pointer to a head commit.
///
/// Exactly one head commit per name at any instant. Updating the head is the
/// only allowed mutation in the whole data model, and it happens exclusively
/// through [`RefStore::compare_and_swap`](crate::RefStore::compare_and_swap).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    /// Human-readable ref name (e.g. "main").
    pub name: String,
    /// Id of the commit at the head of this ref.
    pub head: ObjectId,
}

impl Ref {
    /// Create a new ref pointing at the given head commit.
    pub fn new(name: impl Into<String>, head: ObjectId) -> Self {
        Self {
            name: name.into(),
            head,
        }
    }
}
