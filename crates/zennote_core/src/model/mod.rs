//! In-memory domain model for the note sidebar.
//!
//! # Responsibility
//! - Define the folder/note tree and its traversal.
//! - Normalize display titles before they become store keys.
//!
//! # Invariants
//! - Every node is addressed by a stable `NodeId`, never by position.
//! - The model is storage-agnostic; it never reads or writes the store.

pub mod title;
pub mod tree;
