use std::cell::Cell;
use std::collections::BTreeSet;
use zennote_core::{
    KvStore, MemoryKvStore, NodeId, StoreError, StoreResult, SyncError, TreeError,
    WelcomeState, WorkspaceError, WorkspaceService, HAS_WELCOME_NOTE_KEY,
    WELCOME_NOTE_DEFAULT_CONTENT, WELCOME_NOTE_TITLE,
};

fn open(store: &MemoryKvStore) -> WorkspaceService<&MemoryKvStore> {
    WorkspaceService::open(store).unwrap()
}

fn welcome_id<S: KvStore>(workspace: &WorkspaceService<S>) -> NodeId {
    workspace.tree().find_note(WELCOME_NOTE_TITLE).unwrap().id
}

fn note_pairs<S: KvStore>(workspace: &WorkspaceService<S>) -> BTreeSet<(String, String)> {
    workspace
        .tree()
        .notes()
        .into_iter()
        .map(|note| (note.title.clone(), note.content.clone()))
        .collect()
}

#[test]
fn fresh_store_opens_with_selected_welcome_note() {
    let store = MemoryKvStore::new();
    let workspace = open(&store);

    assert_eq!(workspace.tree().len(), 1);
    assert_eq!(workspace.welcome_state(), WelcomeState::Present);
    assert!(!workspace.can_restore_welcome());
    let active = workspace.tree().active().unwrap();
    assert_eq!(active.title, WELCOME_NOTE_TITLE);
    assert_eq!(active.content, WELCOME_NOTE_DEFAULT_CONTENT);
    assert_eq!(
        store.get(HAS_WELCOME_NOTE_KEY).unwrap().as_deref(),
        Some("true")
    );
}

#[test]
fn stored_note_loads_beside_seeded_welcome() {
    let store = MemoryKvStore::from_entries([("note:Todo", "buy milk")]);
    let workspace = open(&store);

    let expected: BTreeSet<(String, String)> = [
        (
            WELCOME_NOTE_TITLE.to_string(),
            WELCOME_NOTE_DEFAULT_CONTENT.to_string(),
        ),
        ("Todo".to_string(), "buy milk".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(note_pairs(&workspace), expected);
    assert_eq!(workspace.tree().roots()[0], welcome_id(&workspace));
}

#[test]
fn reload_is_idempotent_and_drops_unsaved_notes() {
    let store = MemoryKvStore::from_entries([("note:a", "1"), ("note:b", "2")]);
    let mut workspace = open(&store);
    let before = note_pairs(&workspace);

    let scratch = workspace.create_note(None, Some("scratch")).unwrap();
    workspace.set_content(scratch, "not saved").unwrap();
    workspace.reload().unwrap();

    assert_eq!(note_pairs(&workspace), before);
}

#[test]
fn folder_delete_removes_descendants_and_their_keys() {
    let store = MemoryKvStore::new();
    let mut workspace = open(&store);

    let outside = workspace.create_note(None, Some("outside")).unwrap();
    workspace.save_note(outside).unwrap();

    let projects = workspace.create_folder(None, Some("Projects")).unwrap();
    let alpha = workspace.create_folder(Some(projects), Some("Alpha")).unwrap();
    let spec = workspace.create_note(Some(alpha), Some("alpha spec")).unwrap();
    let plan = workspace.create_note(Some(projects), Some("plan")).unwrap();
    let draft = workspace.create_note(Some(projects), Some("draft")).unwrap();
    for note in [spec, plan] {
        workspace.set_content(note, "body").unwrap();
        workspace.save_note(note).unwrap();
    }
    workspace.set_active(Some(spec)).unwrap();

    let removed: Vec<NodeId> = workspace
        .delete_item(projects)
        .unwrap()
        .into_iter()
        .map(|node| node.id)
        .collect();

    assert_eq!(removed, vec![spec, alpha, plan, draft, projects]);
    for id in &removed {
        assert!(!workspace.tree().contains(*id));
    }
    assert_eq!(workspace.tree().active_id(), None);
    assert_eq!(store.get("note:alpha spec").unwrap(), None);
    assert_eq!(store.get("note:plan").unwrap(), None);
    assert_eq!(store.get("note:outside").unwrap().as_deref(), Some(""));
    assert!(workspace.tree().contains(outside));
}

#[test]
fn note_rename_migrates_store_entry() {
    let store = MemoryKvStore::new();
    let mut workspace = open(&store);
    let note = workspace.create_note(None, Some("A")).unwrap();
    workspace.set_content(note, "C").unwrap();
    workspace.save_note(note).unwrap();

    workspace.rename(note, "B").unwrap();

    assert_eq!(workspace.tree().get(note).unwrap().title, "B");
    assert_eq!(store.get("note:A").unwrap(), None);
    assert_eq!(store.get("note:B").unwrap().as_deref(), Some("C"));
}

#[test]
fn folder_rename_touches_no_keys() {
    let store = MemoryKvStore::new();
    let mut workspace = open(&store);
    let before = store.snapshot();

    let folder = workspace.create_folder(None, None).unwrap();
    assert_eq!(workspace.tree().get(folder).unwrap().title, "New Folder");
    workspace.rename(folder, "Archive").unwrap();

    assert_eq!(workspace.tree().get(folder).unwrap().title, "Archive");
    assert_eq!(store.snapshot(), before);
}

#[test]
fn rename_collisions_are_rejected_without_changes() {
    let store = MemoryKvStore::new();
    let mut workspace = open(&store);
    let first = workspace.create_note(None, Some("first")).unwrap();
    let second = workspace.create_note(None, Some("second")).unwrap();
    workspace.save_note(first).unwrap();
    workspace.save_note(second).unwrap();
    let before = store.snapshot();

    let err = workspace.rename(second, "first").unwrap_err();
    assert!(matches!(err, WorkspaceError::TitleConflict(title) if title == "first"));

    let err = workspace.rename(second, WELCOME_NOTE_TITLE).unwrap_err();
    assert!(matches!(err, WorkspaceError::ReservedTitle));

    let err = workspace
        .rename(welcome_id(&workspace), "Hello")
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::WelcomeNoteRename));

    assert_eq!(workspace.tree().get(second).unwrap().title, "second");
    assert_eq!(store.snapshot(), before);
}

#[test]
fn welcome_soft_delete_and_restore_preserves_content() {
    let store = MemoryKvStore::new();
    let mut workspace = open(&store);
    let welcome = welcome_id(&workspace);
    workspace.set_content(welcome, "my own intro").unwrap();
    workspace.save_note(welcome).unwrap();
    let other = workspace.create_note(None, Some("other")).unwrap();
    workspace.set_active(Some(welcome)).unwrap();

    workspace.delete_item(welcome).unwrap();

    assert_eq!(workspace.welcome_state(), WelcomeState::SoftDeleted);
    assert!(workspace.can_restore_welcome());
    assert!(workspace.tree().find_note(WELCOME_NOTE_TITLE).is_none());
    assert_eq!(workspace.tree().active_id(), Some(other));
    assert_eq!(
        store.get(HAS_WELCOME_NOTE_KEY).unwrap().as_deref(),
        Some("false")
    );
    assert_eq!(
        store.get("note:Welcome to Zen Note").unwrap().as_deref(),
        Some("my own intro")
    );

    let restored = workspace.restore_welcome().unwrap();

    let node = workspace.tree().get(restored).unwrap();
    assert_eq!(node.title, WELCOME_NOTE_TITLE);
    assert_eq!(node.content, "my own intro");
    assert_eq!(workspace.tree().active_id(), Some(restored));
    assert_eq!(workspace.tree().roots().last(), Some(&restored));
    assert!(!workspace.can_restore_welcome());
    assert_eq!(
        store.get(HAS_WELCOME_NOTE_KEY).unwrap().as_deref(),
        Some("true")
    );
}

#[test]
fn soft_deleted_welcome_survives_reload_and_restore_is_idempotent() {
    let store = MemoryKvStore::new();
    {
        let mut workspace = open(&store);
        let welcome = welcome_id(&workspace);
        workspace.delete_item(welcome).unwrap();
    }

    let mut workspace = open(&store);
    assert!(workspace.tree().is_empty());
    assert!(workspace.can_restore_welcome());

    let first = workspace.restore_welcome().unwrap();
    let second = workspace.restore_welcome().unwrap();
    assert_eq!(first, second);
    assert_eq!(workspace.tree().len(), 1);
    assert_eq!(
        workspace.tree().get(first).unwrap().content,
        WELCOME_NOTE_DEFAULT_CONTENT
    );
}

#[test]
fn welcome_inside_deleted_folder_is_soft_deleted() {
    let store = MemoryKvStore::new();
    let mut workspace = open(&store);
    let folder = workspace.create_folder(None, Some("Old")).unwrap();
    workspace.move_node(welcome_id(&workspace), Some(folder)).unwrap();

    workspace.delete_item(folder).unwrap();

    assert!(workspace.can_restore_welcome());
    assert!(store.get("note:Welcome to Zen Note").unwrap().is_some());
}

#[test]
fn create_note_in_folder_expands_and_selects() {
    let store = MemoryKvStore::new();
    let mut workspace = open(&store);
    let folder = workspace.create_folder(None, Some("Inbox")).unwrap();
    assert!(!workspace.toggle_folder(folder).unwrap());

    let note = workspace.create_note(Some(folder), None).unwrap();

    assert!(workspace.tree().get(folder).unwrap().expanded);
    assert_eq!(workspace.tree().children(folder).unwrap(), &[note]);
    assert_eq!(workspace.tree().active_id(), Some(note));
    assert_eq!(workspace.tree().get(note).unwrap().title, "New Note");
}

#[test]
fn stale_ids_fail_fast() {
    let store = MemoryKvStore::new();
    let mut workspace = open(&store);
    let note = workspace.create_note(None, Some("short lived")).unwrap();
    workspace.delete_item(note).unwrap();

    for err in [
        workspace.rename(note, "again").unwrap_err(),
        workspace.delete_item(note).unwrap_err(),
        workspace.save_note(note).unwrap_err(),
        workspace.set_active(Some(note)).unwrap_err(),
    ] {
        assert!(matches!(
            err,
            WorkspaceError::Tree(TreeError::NodeNotFound(id)) if id == note
        ));
    }
}

#[test]
fn move_into_own_descendant_is_rejected() {
    let store = MemoryKvStore::new();
    let mut workspace = open(&store);
    let outer = workspace.create_folder(None, Some("outer")).unwrap();
    let inner = workspace.create_folder(Some(outer), Some("inner")).unwrap();

    let err = workspace.move_node(outer, Some(inner)).unwrap_err();
    assert!(matches!(
        err,
        WorkspaceError::Tree(TreeError::CycleDetected { .. })
    ));
    assert_eq!(workspace.tree().get(outer).unwrap().parent_id, None);
}

#[test]
fn tree_snapshot_serializes_for_renderers() {
    let store = MemoryKvStore::new();
    let mut workspace = open(&store);
    let folder = workspace.create_folder(None, Some("Work")).unwrap();
    workspace.create_note(Some(folder), Some("standup")).unwrap();

    let json = serde_json::to_value(workspace.tree().walk()).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["depth"], 0);
    assert_eq!(rows[1]["node"]["kind"], "folder");
    assert_eq!(rows[2]["depth"], 1);
    assert_eq!(rows[2]["node"]["title"], "standup");
}

/// Memory store that can be told to fail every write.
struct BrokenWrites {
    inner: MemoryKvStore,
    failing: Cell<bool>,
}

impl KvStore for BrokenWrites {
    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.failing.get() {
            return Err(StoreError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.put(key, value)
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        self.inner.keys()
    }
}

#[test]
fn failed_rename_keeps_model_and_store_in_step() {
    let store = BrokenWrites {
        inner: MemoryKvStore::from_entries([("note:A", "C")]),
        failing: Cell::new(false),
    };
    let mut workspace = WorkspaceService::open(&store).unwrap();
    let note = workspace.tree().find_note("A").unwrap().id;

    store.failing.set(true);
    let err = workspace.rename(note, "B").unwrap_err();
    assert!(matches!(
        err,
        WorkspaceError::Sync(SyncError::RenameWriteFailed { restored: false, .. })
    ));
    assert_eq!(workspace.tree().get(note).unwrap().title, "A");

    store.failing.set(false);
    workspace.save_note(note).unwrap();
    assert_eq!(store.get("note:A").unwrap().as_deref(), Some("C"));
    assert_eq!(store.get("note:B").unwrap(), None);
}

#[test]
fn failed_save_surfaces_store_error() {
    let store = BrokenWrites {
        inner: MemoryKvStore::new(),
        failing: Cell::new(false),
    };
    let mut workspace = WorkspaceService::open(&store).unwrap();
    let note = workspace.create_note(None, Some("n")).unwrap();
    workspace.set_content(note, "text").unwrap();

    store.failing.set(true);
    let err = workspace.save_active().unwrap_err();
    assert!(matches!(
        err,
        WorkspaceError::Sync(SyncError::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(workspace.tree().get(note).unwrap().content, "text");
}
