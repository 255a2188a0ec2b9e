//! Responsible for transforming the `AppState` into a `UiState` view model.
//!
//! The selection tree is flattened into rows in preorder so any renderer can
//! draw it with nothing more than the depth and parent of each row.

use crate::config::AppConfig;
use crate::core::{CheckState, ExclusionMatcher, NodeId, SelectionTree};
use serde::Serialize;

use super::state::AppState;

/// A serializable representation of the application state for the UI.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub config: AppConfig,
    pub current_path: Option<String>,
    pub pattern_text: String,
    /// Set while the pattern text does not compile.
    pub pattern_error: Option<String>,
    pub tree: Vec<TreeRow>,
    pub total_nodes: usize,
    pub selected_files_count: usize,
    /// Label for the select-all toggle button.
    pub toggle_all_label: String,
    pub can_create_ingest: bool,
    pub has_output: bool,
    /// Summary block of the last digest (directory, file count, tokens).
    pub output_summary: Option<String>,
    pub status_message: String,
}

/// One row of the rendered selection tree.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreeRow {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub name: String,
    pub is_directory: bool,
    pub state: CheckState,
}

/// Creates the complete `UiState` from the current `AppState`.
pub fn generate_ui_state(state: &AppState) -> UiState {
    let tree = state.tree.as_ref().map(build_tree_rows).unwrap_or_default();
    let pattern_error = ExclusionMatcher::parse(&state.pattern_text)
        .err()
        .map(|e| e.to_string());

    UiState {
        config: state.config.clone(),
        current_path: state
            .selected_directory
            .as_ref()
            .map(|p| p.to_string_lossy().to_string()),
        pattern_text: state.pattern_text.clone(),
        pattern_error,
        total_nodes: tree.len(),
        tree,
        selected_files_count: state
            .tree
            .as_ref()
            .map(SelectionTree::checked_files)
            .unwrap_or(0),
        toggle_all_label: if state.all_selected {
            "Deselect All".to_string()
        } else {
            "Select All".to_string()
        },
        can_create_ingest: state.tree.is_some(),
        has_output: state.output.is_some(),
        output_summary: state.output_summary.clone(),
        status_message: state.status_message.clone(),
    }
}

fn build_tree_rows(tree: &SelectionTree) -> Vec<TreeRow> {
    tree.iter()
        .map(|(id, depth)| {
            let node = tree.node(id);
            TreeRow {
                id,
                parent: node.parent,
                depth,
                name: node.name.clone(),
                is_directory: node.is_directory,
                state: node.state,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn rows_follow_tree_order_with_parent_links() {
        let mut tree = SelectionTree::new("/work/repo");
        let root = tree.root();
        let src = tree
            .add_child(root, "src".into(), PathBuf::from("/work/repo/src"), true)
            .unwrap();
        let a = tree
            .add_child(src, "a.py".into(), PathBuf::from("/work/repo/src/a.py"), false)
            .unwrap();

        let mut state = AppState::new(AppConfig::default());
        state.tree = Some(tree);
        let ui = generate_ui_state(&state);

        assert_eq!(ui.tree.len(), 3);
        assert_eq!(ui.tree[2].id, a);
        assert_eq!(ui.tree[2].parent, Some(src));
        assert_eq!(ui.tree[2].depth, 2);
        assert_eq!(ui.selected_files_count, 1);
        assert_eq!(ui.toggle_all_label, "Select All");
        assert!(ui.can_create_ingest);
        assert!(ui.pattern_error.is_none());
    }

    #[test]
    fn digest_summary_is_exposed_with_the_output() {
        let mut state = AppState::new(AppConfig::default());
        let ui = generate_ui_state(&state);
        assert!(!ui.has_output);
        assert!(ui.output_summary.is_none());

        state.output = Some("<codebase>\n\n</codebase>".to_string());
        state.output_summary = Some("Directory: repo\nFiles analyzed: 0\n".to_string());
        let ui = generate_ui_state(&state);
        assert!(ui.has_output);
        assert_eq!(
            ui.output_summary.as_deref(),
            Some("Directory: repo\nFiles analyzed: 0\n")
        );
    }

    #[test]
    fn invalid_pattern_text_is_reported() {
        let mut state = AppState::new(AppConfig::default());
        state.pattern_text = "(".to_string();
        let ui = generate_ui_state(&state);
        assert!(ui.pattern_error.is_some());
        assert!(!ui.can_create_ingest);
    }
}
