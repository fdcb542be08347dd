//! Read/write bridge between the note tree and the key-value store.
//!
//! # Responsibility
//! - Rebuild a `NoteTree` from the store on load.
//! - Perform every store write: explicit saves, rename migrations, deletes
//!   and Welcome Note bookkeeping.
//!
//! # Invariants
//! - This is the only component that touches the store.
//! - Note content is written only by `persist_note` and `persist_rename`.
//! - The Welcome Note content key is never deleted.
//! - Load order among stored notes follows store iteration order and is
//!   not guaranteed.
//! - Log events carry counts and outcomes only, never titles or content.

use crate::model::tree::{NodeId, NoteTree, TreeError};
use crate::repo::kv_store::{KvStore, StoreError};
use crate::repo::note_keys::{
    decode_flag, encode_flag, note_key, note_title_from_key, HAS_WELCOME_NOTE_KEY,
};
use crate::service::welcome::{
    is_welcome_title, WelcomeState, WELCOME_NOTE_DEFAULT_CONTENT, WELCOME_NOTE_TITLE,
};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type SyncResult<T> = Result<T, SyncError>;

/// Errors from sync operations.
#[derive(Debug)]
pub enum SyncError {
    /// Store call failed.
    Store(StoreError),
    /// Rebuilding the tree failed.
    Tree(TreeError),
    /// Rename deleted the old key but could not write the new one, even
    /// after one retry. `restored` tells whether the old entry was put back.
    RenameWriteFailed {
        old_title: String,
        new_title: String,
        restored: bool,
        source: StoreError,
    },
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Tree(err) => write!(f, "{err}"),
            Self::RenameWriteFailed {
                old_title,
                new_title,
                restored,
                source,
            } => {
                write!(
                    f,
                    "failed to save renamed note `{old_title}` as `{new_title}`: {source}"
                )?;
                if !restored {
                    write!(f, " (previous entry could not be restored)")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Tree(err) => Some(err),
            Self::RenameWriteFailed { source, .. } => Some(source),
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<TreeError> for SyncError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

/// Result of `load_all`.
#[derive(Debug, Clone)]
pub struct LoadedWorkspace {
    pub tree: NoteTree,
    /// State after reconciliation: `Present` or `SoftDeleted`.
    pub welcome_state: WelcomeState,
    /// Tree node of the Welcome Note when it is visible.
    pub welcome_id: Option<NodeId>,
}

/// What `persist_delete` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Note key removed (or was already absent).
    Removed,
    /// Welcome Note hidden; its content stays stored.
    SoftDeleted,
}

/// Sync engine over one store.
pub struct SyncEngine<S: KvStore> {
    store: S,
}

impl<S: KvStore> SyncEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Rebuilds the tree from the store.
    ///
    /// Reconciles the Welcome Note first (seeding it on first run), then
    /// adds one root-level note per stored `note:` key. Calling this twice
    /// against an unchanged store yields the same set of notes.
    pub fn load_all(&self) -> SyncResult<LoadedWorkspace> {
        let started_at = Instant::now();
        match self.load_all_inner() {
            Ok(loaded) => {
                info!(
                    "event=workspace_load module=sync status=ok notes={} welcome_state={} duration_ms={}",
                    loaded.tree.len(),
                    loaded.welcome_state,
                    started_at.elapsed().as_millis()
                );
                Ok(loaded)
            }
            Err(err) => {
                error!(
                    "event=workspace_load module=sync status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Explicit save of one note: `note:<title> -> content`.
    pub fn persist_note(&self, title: &str, content: &str) -> SyncResult<()> {
        self.store.put(&note_key(title), content)?;
        debug!(
            "event=note_save module=sync status=ok bytes={}",
            content.len()
        );
        Ok(())
    }

    /// Moves a note's entry from `old_title` to `new_title`.
    ///
    /// The old key is deleted first, then `content` is written under the
    /// new key. A failed write is retried once; if that also fails, the
    /// previously stored entry is written back and
    /// `SyncError::RenameWriteFailed` is returned.
    pub fn persist_rename(
        &self,
        old_title: &str,
        new_title: &str,
        content: &str,
    ) -> SyncResult<()> {
        if old_title == new_title {
            return self.persist_note(new_title, content);
        }

        let old_key = note_key(old_title);
        let new_key = note_key(new_title);
        let previous = self.store.get(&old_key)?;
        self.store.delete(&old_key)?;

        let Err(first) = self.store.put(&new_key, content) else {
            debug!("event=note_rename module=sync status=ok attempts=1");
            return Ok(());
        };
        warn!(
            "event=note_rename module=sync status=retry attempts=1 error={}",
            first
        );

        let Err(source) = self.store.put(&new_key, content) else {
            debug!("event=note_rename module=sync status=ok attempts=2");
            return Ok(());
        };

        let restored = match previous.as_deref() {
            Some(value) => self.store.put(&old_key, value).is_ok(),
            None => true,
        };
        error!(
            "event=note_rename module=sync status=error attempts=2 restored={} error_code=rename_write_failed error={}",
            restored, source
        );
        Err(SyncError::RenameWriteFailed {
            old_title: old_title.to_string(),
            new_title: new_title.to_string(),
            restored,
            source,
        })
    }

    /// Removes a note's entry; for the Welcome Note, records a soft delete
    /// and keeps the content.
    pub fn persist_delete(&self, title: &str) -> SyncResult<DeleteOutcome> {
        if is_welcome_title(title) {
            self.set_welcome_visible(false)?;
            info!("event=welcome_soft_delete module=sync status=ok");
            return Ok(DeleteOutcome::SoftDeleted);
        }
        self.store.delete(&note_key(title))?;
        debug!("event=note_delete module=sync status=ok");
        Ok(DeleteOutcome::Removed)
    }

    /// Current Welcome Note state as recorded in the store.
    pub fn welcome_state(&self) -> SyncResult<WelcomeState> {
        let flag = self
            .store
            .get(HAS_WELCOME_NOTE_KEY)?
            .as_deref()
            .and_then(decode_flag);
        let has_content = self.store.get(&note_key(WELCOME_NOTE_TITLE))?.is_some();
        Ok(WelcomeState::from_store(flag, has_content))
    }

    /// Writes the `has_welcome_note` flag.
    pub fn set_welcome_visible(&self, visible: bool) -> SyncResult<()> {
        self.store
            .put(HAS_WELCOME_NOTE_KEY, encode_flag(visible))?;
        Ok(())
    }

    /// Returns the stored Welcome Note content, seeding the default when
    /// the key is absent.
    pub fn welcome_content(&self) -> SyncResult<String> {
        let key = note_key(WELCOME_NOTE_TITLE);
        if let Some(content) = self.store.get(&key)? {
            return Ok(content);
        }
        self.store.put(&key, WELCOME_NOTE_DEFAULT_CONTENT)?;
        info!("event=welcome_seed module=sync status=ok");
        Ok(WELCOME_NOTE_DEFAULT_CONTENT.to_string())
    }

    fn load_all_inner(&self) -> SyncResult<LoadedWorkspace> {
        let welcome_state = self.reconcile_welcome()?;

        let mut tree = NoteTree::new();
        let welcome_id = if welcome_state.is_visible() {
            let content = self.welcome_content()?;
            Some(tree.create_note(None, WELCOME_NOTE_TITLE, content)?)
        } else {
            None
        };

        for key in self.store.keys()? {
            let Some(title) = note_title_from_key(&key) else {
                continue;
            };
            if is_welcome_title(title) {
                continue;
            }
            if let Some(content) = self.store.get(&key)? {
                tree.create_note(None, title, content)?;
            }
        }

        Ok(LoadedWorkspace {
            tree,
            welcome_state,
            welcome_id,
        })
    }

    fn reconcile_welcome(&self) -> SyncResult<WelcomeState> {
        let stored = self.welcome_state()?;
        if stored.is_visible() {
            self.welcome_content()?;
            let flag = self
                .store
                .get(HAS_WELCOME_NOTE_KEY)?
                .as_deref()
                .and_then(decode_flag);
            if flag != Some(true) {
                self.set_welcome_visible(true)?;
            }
        }
        Ok(stored.after_load())
    }
}
