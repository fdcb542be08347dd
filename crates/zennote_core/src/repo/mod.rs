//! Persistence layer: the key-value store adapter.
//!
//! # Responsibility
//! - Define the storage contract used by the sync engine.
//! - Own the `note:<title>` / `has_welcome_note` key layout.
//!
//! # Invariants
//! - No other module builds store keys by hand.

pub mod kv_store;
pub mod note_keys;
