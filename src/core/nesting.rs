//! Double-nesting detection and collapse.
//!
//! A directory is double-nested when it has a direct child directory with
//! its own name (`pkg/pkg/...`). Collapsing moves the inner directory's
//! entries up one level and removes the inner directory. When an incoming
//! entry collides with an existing one, two directories are merged with the
//! same rule applied recursively; any other collision renames the incoming
//! entry to `<stem>_<n><.ext>` with the smallest free `n`.

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::error::CoreError;

/// Collapses every double-nested directory strictly below `root`.
///
/// `root` itself is only a container: its own name is not compared with
/// its children. A single pass reaches a fixed point, so running this again
/// on its output changes nothing.
pub fn collapse_double_nesting(root: &Path) -> Result<usize, CoreError> {
    let mut collapsed = 0;
    let mut stack: Vec<PathBuf> = sorted_subdirs(root)?.into_iter().rev().collect();

    while let Some(dir) = stack.pop() {
        while let Some(inner) = nested_duplicate(&dir) {
            tracing::info!("Collapsing double-nested directory {}", inner.display());
            collapse_into(&dir, &inner)?;
            collapsed += 1;
        }
        stack.extend(sorted_subdirs(&dir)?.into_iter().rev());
    }

    Ok(collapsed)
}

/// Returns `dir/<name of dir>` when it exists as a directory.
pub fn nested_duplicate(dir: &Path) -> Option<PathBuf> {
    let name = dir.file_name()?;
    let inner = dir.join(name);
    fs::symlink_metadata(&inner)
        .ok()
        .filter(|md| md.is_dir())
        .map(|_| inner)
}

/// Removes every segment that repeats the segment right before it.
///
/// `a/a/b/b/b/c` becomes `a/b/c`.
pub fn elide_duplicate_segments(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    let mut previous: Option<&std::ffi::OsStr> = None;
    for component in path.components() {
        if let Component::Normal(segment) = component {
            if previous == Some(segment) {
                continue;
            }
            previous = Some(segment);
        } else {
            previous = None;
        }
        result.push(component.as_os_str());
    }
    result
}

/// First path `dir/<stem>_<n><.ext>` (n = 1, 2, ...) that does not exist yet.
pub fn unique_sibling(dir: &Path, name: &Path) -> PathBuf {
    let stem = name
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| name.as_os_str().to_os_string());
    let extension = name.extension();

    let mut counter = 1usize;
    loop {
        let mut candidate = OsString::from(&stem);
        candidate.push(format!("_{counter}"));
        if let Some(ext) = extension {
            candidate.push(".");
            candidate.push(ext);
        }
        let target = dir.join(&candidate);
        if fs::symlink_metadata(&target).is_err() {
            return target;
        }
        counter += 1;
    }
}

/// Moves all entries of `inner` into `dir`, then removes `inner`.
fn collapse_into(dir: &Path, inner: &Path) -> Result<(), CoreError> {
    // Move the inner directory aside first so entries named like it (a third
    // level of nesting) do not collide with the directory being drained.
    let staging = staging_path(dir);
    fs::rename(inner, &staging).map_err(|e| CoreError::io(e, inner))?;
    merge_into(&staging, dir)
}

fn staging_path(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut counter = 0usize;
    loop {
        let candidate = dir.join(format!(".{name}.collapse-{counter}"));
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        counter += 1;
    }
}

/// Moves the contents of `src` into `dest` and deletes `src`.
fn merge_into(src: &Path, dest: &Path) -> Result<(), CoreError> {
    let mut work = vec![(src.to_path_buf(), dest.to_path_buf())];
    let mut drained = Vec::new();

    while let Some((from, to)) = work.pop() {
        for item in sorted_entries(&from)? {
            let Some(name) = item.file_name() else {
                continue;
            };
            let target = to.join(name);
            match fs::symlink_metadata(&target) {
                Err(_) => {
                    fs::rename(&item, &target).map_err(|e| CoreError::io(e, &item))?;
                }
                Ok(existing) if existing.is_dir() && is_real_dir(&item) => {
                    work.push((item, target));
                }
                Ok(_) => {
                    let renamed = unique_sibling(&to, Path::new(name));
                    tracing::debug!(
                        "Name collision at {}, moving to {}",
                        target.display(),
                        renamed.display()
                    );
                    fs::rename(&item, &renamed).map_err(|e| CoreError::io(e, &item))?;
                }
            }
        }
        drained.push(from);
    }

    // Children were pushed after their parents, so remove in reverse.
    for dir in drained.iter().rev() {
        fs::remove_dir(dir).map_err(|e| CoreError::io(e, dir))?;
    }
    Ok(())
}

fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|md| md.is_dir())
        .unwrap_or(false)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| CoreError::io(e, dir))? {
        let entry = entry.map_err(|e| CoreError::io(e, dir))?;
        entries.push(entry.path());
    }
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, CoreError> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|p| is_real_dir(p))
        .collect())
}
