//! Builds a [`SelectionTree`] from a directory on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::exclusion::ExclusionMatcher;
use super::selection::{NodeId, SelectionTree};

/// Stateless builder; see [`TreeBuilder::build`].
pub struct TreeBuilder;

impl TreeBuilder {
    /// Walks `root_path` and returns a fully checked selection tree.
    ///
    /// Entries are visited in byte-wise name order. Excluded names are
    /// skipped along with everything beneath them. A directory named like
    /// the directory that contains it is not added as a node: its entries
    /// are spliced into the enclosing node instead. Directories that cannot
    /// be listed show up as empty nodes. The root is canonicalized first, so
    /// `.` or a symlinked path gets the real directory name.
    pub fn build(root_path: &Path, matcher: &ExclusionMatcher) -> Result<SelectionTree, CoreError> {
        if !root_path.is_dir() {
            return Err(CoreError::NotADirectory(root_path.to_path_buf()));
        }
        let root_path =
            &fs::canonicalize(root_path).map_err(|e| CoreError::io(e, root_path))?;

        let mut tree = SelectionTree::new(root_path);

        // Explicit stack of open directory listings. Each frame keeps the
        // node entries are attached to and the directory being listed, so
        // a spliced directory simply pushes a frame for the same node.
        let mut stack: Vec<Frame> = vec![Frame::open(tree.root(), root_path.to_path_buf())];

        while let Some(frame) = stack.last_mut() {
            let Some(entry) = frame.entries.next() else {
                stack.pop();
                continue;
            };
            let parent_id = frame.node;
            let folder_name = frame.folder.file_name().map(|n| n.to_os_string());

            let Some(name) = entry.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if matcher.is_excluded(&name) {
                tracing::debug!("Excluded {}", entry.display());
                continue;
            }

            if entry.is_dir() {
                if folder_name.as_deref() == entry.file_name() {
                    tracing::debug!("Collapsing double-nested directory {}", entry.display());
                    stack.push(Frame::open(parent_id, entry));
                } else {
                    let child = tree.add_child(parent_id, name, entry.clone(), true)?;
                    stack.push(Frame::open(child, entry));
                }
            } else {
                tree.add_child(parent_id, name, entry, false)?;
            }
        }

        tracing::info!(
            "Built selection tree for {} with {} nodes",
            root_path.display(),
            tree.len()
        );
        Ok(tree)
    }
}

struct Frame {
    node: NodeId,
    folder: PathBuf,
    entries: std::vec::IntoIter<PathBuf>,
}

impl Frame {
    fn open(node: NodeId, folder: PathBuf) -> Self {
        let entries = sorted_entries(&folder).into_iter();
        Self {
            node,
            folder,
            entries,
        }
    }
}

/// Lists a directory sorted by name. Unreadable directories list as empty.
fn sorted_entries(folder: &Path) -> Vec<PathBuf> {
    let read_dir = match fs::read_dir(folder) {
        Ok(rd) => rd,
        Err(e) => {
            log_unreadable(folder, &e);
            return Vec::new();
        }
    };

    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in read_dir {
        match entry {
            Ok(entry) => entries.push(entry.path()),
            Err(e) => {
                log_unreadable(folder, &e);
                return Vec::new();
            }
        }
    }
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    entries
}

fn log_unreadable(folder: &Path, err: &io::Error) {
    if err.kind() == io::ErrorKind::PermissionDenied {
        tracing::warn!("Permission denied listing {}, treating as empty", folder.display());
    } else {
        tracing::warn!(
            "Failed to list {}: {}, treating as empty",
            folder.display(),
            err
        );
    }
}
