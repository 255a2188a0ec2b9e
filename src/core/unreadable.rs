//! Post-materialization scan for files that cannot be shown as text.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::error::CoreError;
use crate::utils::file_detection::is_unreadable;

/// Returns the paths, relative to `scratch_root`, of every regular file that
/// is binary by extension, not valid UTF-8, or not readable.
///
/// The walk is sorted by file name, so the order is deterministic.
pub fn scan_unreadable(scratch_root: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let mut unreadable = Vec::new();

    for entry in WalkDir::new(scratch_root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                tracing::warn!("Skipping {} during unreadable scan: {}", path.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if is_unreadable(entry.path()) {
            let relative = entry.path().strip_prefix(scratch_root)?;
            unreadable.push(relative.to_path_buf());
        }
    }

    tracing::debug!("Found {} unreadable files", unreadable.len());
    Ok(unreadable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn flags_binary_extensions_and_undecodable_content() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.py"), "print('hello')\n").unwrap();
        fs::write(root.join("img.png"), "not really a png").unwrap();
        fs::write(root.join("blob.txt"), [0xc3, 0x28, 0xa0, 0xa1]).unwrap();

        let found = scan_unreadable(root).unwrap();

        assert_eq!(
            found,
            vec![PathBuf::from("blob.txt"), PathBuf::from("img.png")]
        );
    }

    #[test]
    fn empty_tree_has_nothing_to_report() {
        let dir = tempdir().unwrap();
        assert!(scan_unreadable(dir.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn permission_denied_file_is_unreadable() {
        use crate::utils::test_helpers::{permission_tests_unsupported, Locked};

        if permission_tests_unsupported("permission_denied_file_is_unreadable") {
            return;
        }
        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked.txt");
        fs::write(&locked, "secret").unwrap();

        let found = {
            let _guard = Locked::new(&locked, 0o644);
            scan_unreadable(dir.path()).unwrap()
        };

        assert_eq!(found, vec![PathBuf::from("locked.txt")]);
    }
}
