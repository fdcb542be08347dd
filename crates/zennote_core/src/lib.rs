//! Core of Zen Note: the folder/note tree and its key-value persistence.
//! The UI renders `NoteTree` and calls `WorkspaceService`; nothing else
//! talks to the store.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::title::normalize_title;
pub use model::tree::{NodeId, NodeKind, NoteTree, TreeEntry, TreeError, TreeNode, TreeResult};
pub use repo::kv_store::{KvStore, MemoryKvStore, SqliteKvStore, StoreError, StoreResult};
pub use repo::note_keys::{note_key, HAS_WELCOME_NOTE_KEY, NOTE_KEY_PREFIX};
pub use service::sync_engine::{DeleteOutcome, LoadedWorkspace, SyncEngine, SyncError, SyncResult};
pub use service::welcome::{WelcomeState, WELCOME_NOTE_DEFAULT_CONTENT, WELCOME_NOTE_TITLE};
pub use service::workspace_service::{
    WorkspaceError, WorkspaceResult, WorkspaceService, DEFAULT_FOLDER_TITLE, DEFAULT_NOTE_TITLE,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
