//! Use-case services on top of the tree and the store.
//!
//! # Responsibility
//! - Keep the tree and the key-value store in step (`sync_engine`).
//! - Own the Welcome Note lifecycle (`welcome`).
//! - Expose the operations the UI calls (`workspace_service`).

pub mod sync_engine;
pub mod welcome;
pub mod workspace_service;
