//! Workspace use-case service.
//!
//! # Responsibility
//! - Be the single entry point the UI calls for tree mutations and saves.
//! - Enforce title policy above the tree primitives.
//! - Route every store write through the sync engine before the tree
//!   changes, so a failed write leaves the in-memory tree as it was.
//!
//! # Invariants
//! - Note titles are unique among tree notes; collisions are rejected.
//! - The Welcome Note title is reserved and the Welcome Note is never renamed.
//! - Content edits stay in memory until `save_note`/`save_active`.

use crate::model::title::normalize_title;
use crate::model::tree::{NodeId, NoteTree, TreeError, TreeNode};
use crate::repo::kv_store::KvStore;
use crate::service::sync_engine::{DeleteOutcome, LoadedWorkspace, SyncEngine, SyncError};
use crate::service::welcome::{is_welcome_title, WelcomeState, WELCOME_NOTE_TITLE};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Title used when a note is created without one.
pub const DEFAULT_NOTE_TITLE: &str = "New Note";
/// Title used when a folder is created without one.
pub const DEFAULT_FOLDER_TITLE: &str = "New Folder";

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Errors from workspace operations.
#[derive(Debug)]
pub enum WorkspaceError {
    /// Title is blank after normalization.
    InvalidTitle,
    /// Another note already uses this title.
    TitleConflict(String),
    /// Title is reserved for the Welcome Note.
    ReservedTitle,
    /// The Welcome Note keeps its reserved title.
    WelcomeNoteRename,
    /// Tree-level failure, including stale node ids.
    Tree(TreeError),
    /// Store-level failure.
    Sync(SyncError),
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::TitleConflict(title) => write!(f, "a note titled `{title}` already exists"),
            Self::ReservedTitle => {
                write!(f, "title `{WELCOME_NOTE_TITLE}` is reserved")
            }
            Self::WelcomeNoteRename => write!(f, "the welcome note cannot be renamed"),
            Self::Tree(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Sync(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TreeError> for WorkspaceError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

impl From<SyncError> for WorkspaceError {
    fn from(value: SyncError) -> Self {
        match value {
            SyncError::Tree(err) => Self::Tree(err),
            other => Self::Sync(other),
        }
    }
}

/// Note workspace: the tree plus its sync engine.
pub struct WorkspaceService<S: KvStore> {
    engine: SyncEngine<S>,
    tree: NoteTree,
    welcome_state: WelcomeState,
}

impl<S: KvStore> WorkspaceService<S> {
    /// Loads the workspace from `store`.
    ///
    /// A visible Welcome Note starts out as the active item.
    pub fn open(store: S) -> WorkspaceResult<Self> {
        let engine = SyncEngine::new(store);
        let loaded = engine.load_all()?;
        let mut service = Self {
            engine,
            tree: NoteTree::new(),
            welcome_state: loaded.welcome_state,
        };
        service.install(loaded)?;
        Ok(service)
    }

    /// Discards the in-memory tree, unsaved edits included, and loads again.
    pub fn reload(&mut self) -> WorkspaceResult<()> {
        let loaded = self.engine.load_all()?;
        self.install(loaded)
    }

    /// Read access for renderers.
    pub fn tree(&self) -> &NoteTree {
        &self.tree
    }

    pub fn store(&self) -> &S {
        self.engine.store()
    }

    pub fn into_store(self) -> S {
        self.engine.into_store()
    }

    pub fn welcome_state(&self) -> WelcomeState {
        self.welcome_state
    }

    /// Whether the "Restore Welcome" affordance should be shown.
    pub fn can_restore_welcome(&self) -> bool {
        self.welcome_state.can_restore()
    }

    /// Appends a folder under `parent` (or at root), expanding `parent`.
    pub fn create_folder(
        &mut self,
        parent: Option<NodeId>,
        name: Option<&str>,
    ) -> WorkspaceResult<NodeId> {
        let title = normalize_title(name.unwrap_or(DEFAULT_FOLDER_TITLE))
            .ok_or(WorkspaceError::InvalidTitle)?;
        let id = self.tree.create_folder(parent, title)?;
        self.expand(parent)?;
        Ok(id)
    }

    /// Appends an empty note under `parent` (or at root) and selects it.
    ///
    /// An explicit title must be free. Without one, the first free title
    /// among `New Note`, `New Note (2)`, ... is used.
    pub fn create_note(
        &mut self,
        parent: Option<NodeId>,
        title: Option<&str>,
    ) -> WorkspaceResult<NodeId> {
        let title = match title {
            Some(value) => {
                let normalized = normalize_title(value).ok_or(WorkspaceError::InvalidTitle)?;
                self.ensure_title_available(None, &normalized)?;
                normalized
            }
            None => self.next_default_note_title(),
        };
        let id = self.tree.create_note(parent, title, String::new())?;
        self.expand(parent)?;
        self.tree.set_active(Some(id))?;
        Ok(id)
    }

    /// Renames a folder in memory, or a note together with its store entry.
    ///
    /// For notes the store entry is migrated first, carrying the current
    /// in-memory content; the title changes only after that succeeded.
    pub fn rename(&mut self, id: NodeId, new_title: &str) -> WorkspaceResult<()> {
        let normalized = normalize_title(new_title).ok_or(WorkspaceError::InvalidTitle)?;
        let node = self.node(id)?;
        if node.is_folder() {
            self.tree.rename(id, normalized)?;
            return Ok(());
        }
        if node.title == normalized {
            return Ok(());
        }
        if is_welcome_title(&node.title) {
            return Err(WorkspaceError::WelcomeNoteRename);
        }
        self.ensure_title_available(Some(id), &normalized)?;

        self.engine
            .persist_rename(&node.title, &normalized, &node.content)?;
        self.tree.rename(id, normalized)?;
        Ok(())
    }

    /// Deletes an item; folders take their whole subtree with them.
    ///
    /// Store deletes run in post-order before the tree changes. The Welcome
    /// Note, wherever it sits in the subtree, is soft-deleted last. Returns
    /// the removed records in post-order.
    pub fn delete_item(&mut self, id: NodeId) -> WorkspaceResult<Vec<TreeNode>> {
        let order = self.tree.subtree_post_order(id)?;
        let mut welcome_in_subtree = false;
        for node_id in &order {
            let node = self.node(*node_id)?;
            if !node.is_note() {
                continue;
            }
            if is_welcome_title(&node.title) {
                welcome_in_subtree = true;
                continue;
            }
            self.engine.persist_delete(&node.title)?;
        }
        if welcome_in_subtree
            && self.engine.persist_delete(WELCOME_NOTE_TITLE)? == DeleteOutcome::SoftDeleted
        {
            self.welcome_state = WelcomeState::SoftDeleted;
        }

        let welcome_was_active = welcome_in_subtree
            && self
                .tree
                .active()
                .is_some_and(|node| is_welcome_title(&node.title));
        let removed = self.tree.remove_subtree(id)?;
        if welcome_was_active {
            let next = self.tree.notes().first().map(|node| node.id);
            self.tree.set_active(next)?;
        }
        Ok(removed)
    }

    pub fn set_active(&mut self, id: Option<NodeId>) -> WorkspaceResult<()> {
        self.tree.set_active(id)?;
        Ok(())
    }

    /// Updates a note's content in memory only.
    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) -> WorkspaceResult<()> {
        self.tree.set_content(id, content)?;
        Ok(())
    }

    /// Writes one note's current content to the store.
    pub fn save_note(&self, id: NodeId) -> WorkspaceResult<()> {
        let node = self.node(id)?;
        if !node.is_note() {
            return Err(TreeError::NodeMustBeNote(id).into());
        }
        self.engine.persist_note(&node.title, &node.content)?;
        Ok(())
    }

    /// Saves the active note. Returns `None` when no note is active.
    pub fn save_active(&self) -> WorkspaceResult<Option<NodeId>> {
        match self.tree.active() {
            Some(node) if node.is_note() => {
                self.save_note(node.id)?;
                Ok(Some(node.id))
            }
            _ => Ok(None),
        }
    }

    /// Moves an item into a folder (or to root), expanding the target.
    pub fn move_node(&mut self, id: NodeId, new_parent: Option<NodeId>) -> WorkspaceResult<()> {
        self.tree.move_node(id, new_parent)?;
        self.expand(new_parent)?;
        Ok(())
    }

    /// Flips a folder's expand state and returns the new value.
    pub fn toggle_folder(&mut self, id: NodeId) -> WorkspaceResult<bool> {
        Ok(self.tree.toggle_expanded(id)?)
    }

    /// Brings the Welcome Note back from its soft-deleted state.
    ///
    /// The note is re-created at the end of the root list from its stored
    /// content and selected. When it is already present, it is just
    /// selected.
    pub fn restore_welcome(&mut self) -> WorkspaceResult<NodeId> {
        if let Some(existing) = self.tree.find_note(WELCOME_NOTE_TITLE).map(|node| node.id) {
            self.tree.set_active(Some(existing))?;
            return Ok(existing);
        }

        let content = self.engine.welcome_content()?;
        self.engine.set_welcome_visible(true)?;
        let id = self.tree.create_note(None, WELCOME_NOTE_TITLE, content)?;
        self.welcome_state = WelcomeState::Present;
        self.tree.set_active(Some(id))?;
        Ok(id)
    }

    fn install(&mut self, loaded: LoadedWorkspace) -> WorkspaceResult<()> {
        self.tree = loaded.tree;
        self.welcome_state = loaded.welcome_state;
        self.tree.set_active(loaded.welcome_id)?;
        Ok(())
    }

    fn node(&self, id: NodeId) -> WorkspaceResult<TreeNode> {
        self.tree
            .get(id)
            .cloned()
            .ok_or(WorkspaceError::Tree(TreeError::NodeNotFound(id)))
    }

    fn expand(&mut self, folder: Option<NodeId>) -> WorkspaceResult<()> {
        if let Some(folder) = folder {
            self.tree.set_expanded(folder, true)?;
        }
        Ok(())
    }

    fn ensure_title_available(&self, owner: Option<NodeId>, title: &str) -> WorkspaceResult<()> {
        if is_welcome_title(title) {
            return Err(WorkspaceError::ReservedTitle);
        }
        match self.tree.find_note(title) {
            Some(existing) if Some(existing.id) != owner => {
                Err(WorkspaceError::TitleConflict(title.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn next_default_note_title(&self) -> String {
        let mut candidate = DEFAULT_NOTE_TITLE.to_string();
        let mut suffix = 2;
        while self.tree.find_note(&candidate).is_some() {
            candidate = format!("{DEFAULT_NOTE_TITLE} ({suffix})");
            suffix += 1;
        }
        candidate
    }
}
