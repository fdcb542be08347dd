//! In-memory folder/note tree.
//!
//! # Responsibility
//! - Hold the canonical sidebar structure as an arena keyed by `NodeId`.
//! - Provide create/rename/move/remove primitives and ordered traversal.
//!
//! # Invariants
//! - Every node sits in exactly one slot: the root list or the `children`
//!   of the folder named by its `parent_id`.
//! - Only folders have children; a folder is never its own ancestor.
//! - `active_id`, when set, names a node that is in the arena.
//! - Failed operations leave the tree untouched.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one tree node for the lifetime of the tree.
pub type NodeId = Uuid;

pub type TreeResult<T> = Result<T, TreeError>;

/// Errors from tree primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Node is not (or no longer) in the tree.
    NodeNotFound(NodeId),
    /// Requested parent is not in the tree.
    ParentNotFound(NodeId),
    /// Requested parent is a note.
    ParentMustBeFolder(NodeId),
    /// Folder-only operation called on a note.
    NodeMustBeFolder(NodeId),
    /// Note-only operation called on a folder.
    NodeMustBeNote(NodeId),
    /// Move would place a folder under itself or a descendant.
    CycleDetected { node_id: NodeId, parent_id: NodeId },
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "tree node not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "tree parent not found: {id}"),
            Self::ParentMustBeFolder(id) => write!(f, "tree parent must be folder: {id}"),
            Self::NodeMustBeFolder(id) => write!(f, "tree node must be folder: {id}"),
            Self::NodeMustBeNote(id) => write!(f, "tree node must be note: {id}"),
            Self::CycleDetected { node_id, parent_id } => write!(
                f,
                "move would create cycle: node {node_id} under parent {parent_id}"
            ),
        }
    }
}

impl Error for TreeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Container that can hold notes and other folders.
    Folder,
    /// Leaf with editable text content.
    Note,
}

/// One folder or note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Display title. For notes, also the store key suffix.
    pub title: String,
    /// `None` means root level.
    pub parent_id: Option<NodeId>,
    /// Ordered children. Always empty for notes.
    pub children: Vec<NodeId>,
    /// Folder expand state. Always `false` for notes.
    pub expanded: bool,
    /// Note body as last edited in memory. Always empty for folders.
    pub content: String,
}

impl TreeNode {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_note(&self) -> bool {
        self.kind == NodeKind::Note
    }
}

/// One row of an ordered traversal.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TreeEntry<'a> {
    /// Nesting depth; root items are `0`.
    pub depth: usize,
    pub node: &'a TreeNode,
}

/// Arena-backed forest of folders and notes.
#[derive(Debug, Clone, Default)]
pub struct NoteTree {
    nodes: HashMap<NodeId, TreeNode>,
    roots: Vec<NodeId>,
    active_id: Option<NodeId>,
}

impl NoteTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Root-level items in display order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Ordered children of a folder.
    pub fn children(&self, id: NodeId) -> TreeResult<&[NodeId]> {
        let node = self.require(id)?;
        if !node.is_folder() {
            return Err(TreeError::NodeMustBeFolder(id));
        }
        Ok(&node.children)
    }

    pub fn active_id(&self) -> Option<NodeId> {
        self.active_id
    }

    pub fn active(&self) -> Option<&TreeNode> {
        self.active_id.and_then(|id| self.nodes.get(&id))
    }

    /// Appends an empty, expanded folder under `parent` (or at root).
    pub fn create_folder(
        &mut self,
        parent: Option<NodeId>,
        title: impl Into<String>,
    ) -> TreeResult<NodeId> {
        self.ensure_parent_is_folder(parent)?;
        let node = TreeNode {
            id: Uuid::new_v4(),
            kind: NodeKind::Folder,
            title: title.into(),
            parent_id: parent,
            children: Vec::new(),
            expanded: true,
            content: String::new(),
        };
        Ok(self.attach(node))
    }

    /// Appends a note under `parent` (or at root).
    ///
    /// Does not check title uniqueness and does not change the active item.
    pub fn create_note(
        &mut self,
        parent: Option<NodeId>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> TreeResult<NodeId> {
        self.ensure_parent_is_folder(parent)?;
        let node = TreeNode {
            id: Uuid::new_v4(),
            kind: NodeKind::Note,
            title: title.into(),
            parent_id: parent,
            children: Vec::new(),
            expanded: false,
            content: content.into(),
        };
        Ok(self.attach(node))
    }

    pub fn rename(&mut self, id: NodeId, title: impl Into<String>) -> TreeResult<()> {
        self.require_mut(id)?.title = title.into();
        Ok(())
    }

    /// Replaces a note's in-memory content. Nothing is persisted.
    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) -> TreeResult<()> {
        let node = self.require_mut(id)?;
        if !node.is_note() {
            return Err(TreeError::NodeMustBeNote(id));
        }
        node.content = content.into();
        Ok(())
    }

    /// Selects `id`, or clears the selection with `None`.
    pub fn set_active(&mut self, id: Option<NodeId>) -> TreeResult<()> {
        if let Some(id) = id {
            self.require(id)?;
        }
        self.active_id = id;
        Ok(())
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> TreeResult<()> {
        let node = self.require_mut(id)?;
        if !node.is_folder() {
            return Err(TreeError::NodeMustBeFolder(id));
        }
        node.expanded = expanded;
        Ok(())
    }

    /// Flips a folder's expand state and returns the new value.
    pub fn toggle_expanded(&mut self, id: NodeId) -> TreeResult<bool> {
        let expanded = !self.require(id)?.expanded;
        self.set_expanded(id, expanded)?;
        Ok(expanded)
    }

    /// Moves `id` to the end of `new_parent`'s children (or of the root list).
    pub fn move_node(&mut self, id: NodeId, new_parent: Option<NodeId>) -> TreeResult<()> {
        self.require(id)?;
        if let Some(parent_id) = new_parent {
            if parent_id == id {
                return Err(TreeError::CycleDetected {
                    node_id: id,
                    parent_id,
                });
            }
            self.ensure_parent_is_folder(Some(parent_id))?;
            if self.is_ancestor(id, parent_id) {
                return Err(TreeError::CycleDetected {
                    node_id: id,
                    parent_id,
                });
            }
        }

        self.detach(id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent_id = new_parent;
        }
        self.push_child(new_parent, id);
        Ok(())
    }

    /// Lists `id` and its descendants, children before parents.
    pub fn subtree_post_order(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        self.require(id)?;
        let mut order = Vec::new();
        self.collect_post_order(id, &mut order);
        Ok(order)
    }

    /// Removes `id` with all descendants and returns them in post-order.
    ///
    /// Clears the active item when it was part of the removed subtree.
    pub fn remove_subtree(&mut self, id: NodeId) -> TreeResult<Vec<TreeNode>> {
        let order = self.subtree_post_order(id)?;
        self.detach(id);

        let mut removed = Vec::with_capacity(order.len());
        for node_id in order {
            if self.active_id == Some(node_id) {
                self.active_id = None;
            }
            if let Some(node) = self.nodes.remove(&node_id) {
                removed.push(node);
            }
        }
        Ok(removed)
    }

    /// Pre-order traversal of the whole forest, collapsed folders included.
    pub fn walk(&self) -> Vec<TreeEntry<'_>> {
        self.traverse(true)
    }

    /// Pre-order traversal that skips the contents of collapsed folders.
    pub fn visible_entries(&self) -> Vec<TreeEntry<'_>> {
        self.traverse(false)
    }

    /// Every note in traversal order.
    pub fn notes(&self) -> Vec<&TreeNode> {
        self.walk()
            .into_iter()
            .map(|entry| entry.node)
            .filter(|node| node.is_note())
            .collect()
    }

    /// Finds the note with exactly this title.
    pub fn find_note(&self, title: &str) -> Option<&TreeNode> {
        self.nodes
            .values()
            .find(|node| node.is_note() && node.title == title)
    }

    fn traverse(&self, include_collapsed: bool) -> Vec<TreeEntry<'_>> {
        let mut entries = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, NodeId)> = self.roots.iter().rev().map(|id| (0, *id)).collect();
        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            entries.push(TreeEntry { depth, node });
            if include_collapsed || node.expanded {
                stack.extend(node.children.iter().rev().map(|child| (depth + 1, *child)));
            }
        }
        entries
    }

    fn collect_post_order(&self, id: NodeId, order: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(&id) {
            for child in &node.children {
                self.collect_post_order(*child, order);
            }
            order.push(id);
        }
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(of);
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            if !visited.insert(current) {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|node| node.parent_id);
        }
        false
    }

    fn attach(&mut self, node: TreeNode) -> NodeId {
        let id = node.id;
        let parent = node.parent_id;
        self.nodes.insert(id, node);
        self.push_child(parent, id);
        id
    }

    fn push_child(&mut self, parent: Option<NodeId>, id: NodeId) {
        match parent.and_then(|parent_id| self.nodes.get_mut(&parent_id)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.nodes.get(&id).and_then(|node| node.parent_id);
        match parent.and_then(|parent_id| self.nodes.get_mut(&parent_id)) {
            Some(parent) => parent.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }
    }

    fn ensure_parent_is_folder(&self, parent: Option<NodeId>) -> TreeResult<()> {
        let Some(parent_id) = parent else {
            return Ok(());
        };
        let node = self
            .nodes
            .get(&parent_id)
            .ok_or(TreeError::ParentNotFound(parent_id))?;
        if !node.is_folder() {
            return Err(TreeError::ParentMustBeFolder(parent_id));
        }
        Ok(())
    }

    fn require(&self, id: NodeId) -> TreeResult<&TreeNode> {
        self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))
    }

    fn require_mut(&mut self, id: NodeId) -> TreeResult<&mut TreeNode> {
        self.nodes.get_mut(&id).ok_or(TreeError::NodeNotFound(id))
    }
}
