//! Foundation types for the Versioned Hierarchy Store (VHS).
//!
//! This crate provides the identifier and error types shared by every other
//! VHS crate.
//!
//! # Key Types
//!
//! - [`ObjectId`] — Content-addressed identifier (BLAKE3 hash)
//! - [`TypeError`] — Parse/validation failures for foundation types

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::ObjectId;
