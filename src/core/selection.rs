//! The in-memory selection tree and its tri-state check rules.
//!
//! Nodes live in an arena owned by [`SelectionTree`]; parents and children
//! are referenced by [`NodeId`]. Toggling a node forces its state onto every
//! descendant, then walks to the root promoting any ancestor whose direct
//! children are all checked. Ancestors are never demoted by that walk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use super::error::CoreError;

/// Index of a node inside its [`SelectionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    pub fn from_index(index: usize) -> Self {
        NodeId(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckState {
    Checked,
    Unchecked,
    /// Informational, directory-only. Never pushed down to children.
    PartiallyChecked,
}

impl CheckState {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }
}

/// One filesystem entry of the selection tree.
#[derive(Debug, Clone)]
pub struct FsNode {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    pub state: CheckState,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct SelectionTree {
    nodes: Vec<FsNode>,
    root_path: PathBuf,
}

impl SelectionTree {
    /// Creates a tree holding only the (checked) root directory node.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        let root_path = root_path.into();
        let name = display_name(&root_path);
        let root = FsNode {
            name,
            path: root_path.clone(),
            is_directory: true,
            state: CheckState::Checked,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root_path,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&FsNode> {
        self.nodes.get(id.0)
    }

    /// Like [`get`](Self::get) for ids handed out by this tree.
    pub fn node(&self, id: NodeId) -> &FsNode {
        &self.nodes[id.0]
    }

    pub fn state(&self, id: NodeId) -> Option<CheckState> {
        self.get(id).map(|n| n.state)
    }

    /// Appends a new checked child under `parent` and returns its id.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: String,
        path: PathBuf,
        is_directory: bool,
    ) -> Result<NodeId, CoreError> {
        if self.get(parent).is_none() {
            return Err(CoreError::UnknownNode(parent));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(FsNode {
            name,
            path,
            is_directory,
            state: CheckState::Checked,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Handles a direct user toggle of one node.
    ///
    /// The new state is forced onto the whole subtree of `id`, then every
    /// ancestor whose direct children are all checked becomes checked.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<(), CoreError> {
        if self.get(id).is_none() {
            return Err(CoreError::UnknownNode(id));
        }
        let state = CheckState::from_checked(checked);
        self.nodes[id.0].state = state;
        self.propagate_down(id, state);
        self.propagate_up(id);
        Ok(())
    }

    /// Select all / deselect all. No propagation is involved.
    pub fn set_all(&mut self, checked: bool) {
        let state = CheckState::from_checked(checked);
        for node in &mut self.nodes {
            node.state = state;
        }
    }

    fn propagate_down(&mut self, id: NodeId, state: CheckState) {
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.clone();
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.0];
            node.state = state;
            stack.extend(node.children.iter().copied());
        }
    }

    fn propagate_up(&mut self, id: NodeId) {
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            let all_checked = self.nodes[parent.0]
                .children
                .iter()
                .all(|child| self.nodes[child.0].state == CheckState::Checked);
            if all_checked {
                self.nodes[parent.0].state = CheckState::Checked;
            }
            current = self.nodes[parent.0].parent;
        }
    }

    /// All nodes below `id` in preorder, `id` itself excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let Some(node) = self.get(id) else {
            return result;
        };
        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        result
    }

    /// Preorder walk over the whole tree with the depth of each node.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        let mut stack = vec![(self.root(), 0usize)];
        std::iter::from_fn(move || {
            let (id, depth) = stack.pop()?;
            for child in self.nodes[id.0].children.iter().rev() {
                stack.push((*child, depth + 1));
            }
            Some((id, depth))
        })
    }

    /// Resolves a path relative to the root by walking node names.
    ///
    /// Lookups follow the tree as built, so entries spliced out of a
    /// double-nested directory are found directly under their new parent.
    pub fn find(&self, relative: &Path) -> Option<NodeId> {
        let mut current = self.root();
        for component in relative.components() {
            match component {
                Component::CurDir => continue,
                Component::Normal(name) => {
                    let name = name.to_string_lossy();
                    current = *self.nodes[current.0]
                        .children
                        .iter()
                        .find(|child| self.nodes[child.0].name == name)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    /// Files that would be copied by a materialization of this tree.
    pub fn checked_files(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.state == CheckState::Unchecked {
                continue;
            }
            if node.is_directory {
                stack.extend(node.children.iter().copied());
            } else {
                count += 1;
            }
        }
        count
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, id: NodeId, state: CheckState) {
        self.nodes[id.0].state = state;
    }
}

/// Base name of a path, falling back to the full path for roots like `/`.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
