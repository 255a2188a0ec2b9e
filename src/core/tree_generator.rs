//! Generates an ASCII representation of a directory tree.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A utility struct for generating an ASCII directory tree.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeGenerator;

impl TreeGenerator {
    /// Renders `entries` (paths relative to the root, with a directory flag)
    /// below a single root line. Directories come first and carry a trailing
    /// `/`; siblings are otherwise ordered by name.
    pub fn generate_tree(entries: &[(PathBuf, bool)], root_name: &str) -> String {
        let mut tree_map: HashMap<PathBuf, TreeNode> = HashMap::new();
        let mut top_level: Vec<PathBuf> = Vec::new();

        for (path, is_directory) in entries {
            Self::insert_into_tree(&mut tree_map, &mut top_level, path, *is_directory);
        }

        let mut result = String::from("Directory structure:\n");
        result.push_str(&format!("└── {root_name}/\n"));
        Self::render_children(&tree_map, &top_level, &mut result, "    ");
        result
    }

    /// Inserts a path and any missing ancestors into the tree map.
    fn insert_into_tree(
        tree_map: &mut HashMap<PathBuf, TreeNode>,
        top_level: &mut Vec<PathBuf>,
        path: &Path,
        is_directory: bool,
    ) {
        let mut current_path = PathBuf::new();

        for component in path.components() {
            let parent_path = current_path.clone();
            current_path.push(component);

            let is_final = current_path == path;
            if tree_map.contains_key(&current_path) {
                if is_final && is_directory {
                    if let Some(node) = tree_map.get_mut(&current_path) {
                        node.is_directory = true;
                    }
                }
                continue;
            }

            tree_map.insert(
                current_path.clone(),
                TreeNode {
                    name: component.as_os_str().to_string_lossy().to_string(),
                    is_directory: if is_final { is_directory } else { true },
                    children: Vec::new(),
                },
            );

            if parent_path.as_os_str().is_empty() {
                top_level.push(current_path.clone());
            } else if let Some(parent_node) = tree_map.get_mut(&parent_path) {
                parent_node.children.push(current_path.clone());
            }
        }
    }

    /// Renders the children of a tree node.
    fn render_children(
        tree_map: &HashMap<PathBuf, TreeNode>,
        children: &[PathBuf],
        result: &mut String,
        prefix: &str,
    ) {
        let mut sorted_children: Vec<&PathBuf> = children.iter().collect();
        sorted_children.sort_by(|a, b| {
            let a_node = &tree_map[*a];
            let b_node = &tree_map[*b];

            // Directories first, then files
            match (a_node.is_directory, b_node.is_directory) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => a_node.name.cmp(&b_node.name),
            }
        });

        for (i, path) in sorted_children.iter().enumerate() {
            let node = &tree_map[*path];
            let is_last = i == sorted_children.len() - 1;

            let connector = if is_last { "└── " } else { "├── " };
            let suffix = if node.is_directory { "/" } else { "" };

            result.push_str(&format!("{prefix}{connector}{}{suffix}\n", node.name));

            if !node.children.is_empty() {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };

                Self::render_children(tree_map, &node.children, result, &new_prefix);
            }
        }
    }
}

/// A transient node used for building the ASCII tree.
#[derive(Debug, Clone)]
struct TreeNode {
    name: String,
    is_directory: bool,
    children: Vec<PathBuf>,
}
