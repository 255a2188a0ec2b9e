//! Copies the checked part of a selection tree into a scratch directory.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::nesting::{collapse_double_nesting, elide_duplicate_segments, unique_sibling};
use super::selection::{CheckState, NodeId, SelectionTree};

/// Counters reported by [`materialize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeStats {
    pub files_copied: usize,
    pub directories_created: usize,
    pub nesting_collapsed: usize,
}

/// Copies every node that is not unchecked into `scratch_root`.
///
/// Unchecked nodes are skipped together with their whole subtree, even if
/// some descendant is checked. Destination paths are the node's path
/// relative to the selected root, with the root's own name in front and
/// consecutive duplicate directory segments elided, so entries that came out of a
/// double-nested directory land where the tree shows them. A file whose
/// destination already exists is renamed rather than overwritten. Once
/// everything is copied the scratch tree gets one more double-nesting
/// cleanup pass.
pub fn materialize(tree: &SelectionTree, scratch_root: &Path) -> Result<MaterializeStats, CoreError> {
    let mut stats = MaterializeStats::default();
    fs::create_dir_all(scratch_root).map_err(|e| CoreError::io(e, scratch_root))?;

    let mut stack: Vec<NodeId> = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let node = tree.node(id);
        if node.state == CheckState::Unchecked {
            continue;
        }

        if id != tree.root() {
            let target = destination(tree, &node.path, node.is_directory, scratch_root)?;
            if node.is_directory {
                fs::create_dir_all(&target).map_err(|e| CoreError::io(e, &target))?;
                stats.directories_created += 1;
            } else {
                copy_file(&node.path, &target)?;
                stats.files_copied += 1;
            }
        }

        if node.is_directory {
            stack.extend(node.children.iter().rev().copied());
        }
    }

    stats.nesting_collapsed = collapse_double_nesting(scratch_root)?;
    tracing::info!(
        "Materialized {} files and {} directories into {}",
        stats.files_copied,
        stats.directories_created,
        scratch_root.display()
    );
    Ok(stats)
}

fn destination(
    tree: &SelectionTree,
    source: &Path,
    is_directory: bool,
    scratch_root: &Path,
) -> Result<PathBuf, CoreError> {
    let root_name = &tree.node(tree.root()).name;
    let relative = source.strip_prefix(tree.root_path())?;

    // A file named like its directory is not nesting; only the directory
    // part of its path is elided.
    let (directory_part, file_name) = if is_directory {
        (relative, None)
    } else {
        (
            relative.parent().unwrap_or(Path::new("")),
            relative.file_name(),
        )
    };

    let mut anchored = PathBuf::from(root_name);
    anchored.push(directory_part);
    let elided = elide_duplicate_segments(&anchored);
    let mut target = scratch_root.join(elided.strip_prefix(root_name)?);
    if let Some(file_name) = file_name {
        target.push(file_name);
    }
    Ok(target)
}

/// Copies content, permissions and modification time of one file.
fn copy_file(source: &Path, target: &Path) -> Result<(), CoreError> {
    let parent = target.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| CoreError::io(e, parent))?;

    let target = if fs::symlink_metadata(target).is_ok() {
        let name = target.file_name().map(Path::new).unwrap_or(Path::new(""));
        let renamed = unique_sibling(parent, name);
        tracing::debug!(
            "{} already exists in scratch tree, copying to {}",
            target.display(),
            renamed.display()
        );
        renamed
    } else {
        target.to_path_buf()
    };

    fs::copy(source, &target).map_err(|e| CoreError::io(e, source))?;
    let metadata = fs::metadata(source).map_err(|e| CoreError::io(e, source))?;
    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    filetime::set_file_mtime(&target, mtime).map_err(|e| CoreError::io(e, &target))?;
    Ok(())
}
