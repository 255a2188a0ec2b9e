//! Digest generation and the final text envelope.
//!
//! [`DigestGenerator`] is the seam to whatever turns a directory into a tree
//! listing plus concatenated file contents. [`DirectoryDigester`] is the
//! built-in implementation; [`assemble`] wraps a digest and the list of
//! unreadable files into the `<codebase>` envelope.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::tree_generator::TreeGenerator;
use crate::utils::file_detection::probe_is_text;

const FILE_SEPARATOR: &str = "================================================";

/// Output of a [`DigestGenerator`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digest {
    pub summary: String,
    pub tree: String,
    pub content: String,
}

/// Turns a directory into a tree listing and concatenated file contents.
///
/// Implementations report failures as plain errors; the message is shown to
/// the user unchanged.
pub trait DigestGenerator: Send + Sync {
    fn generate(&self, directory: &Path) -> Result<Digest>;
}

/// The built-in generator: walks the directory in name order and renders
/// every regular file.
#[derive(Debug, Clone)]
pub struct DirectoryDigester {
    pub max_file_size: u64,
    pub estimate_tokens: bool,
}

impl Default for DirectoryDigester {
    fn default() -> Self {
        Self {
            max_file_size: 20 * 1024 * 1024,
            estimate_tokens: true,
        }
    }
}

impl DigestGenerator for DirectoryDigester {
    fn generate(&self, directory: &Path) -> Result<Digest> {
        if !directory.is_dir() {
            anyhow::bail!("Path is not a directory: {}", directory.display());
        }

        let mut entries: Vec<(PathBuf, bool)> = Vec::new();
        let mut content = String::new();
        let mut files_analyzed = 0usize;

        for entry in WalkDir::new(directory)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.with_context(|| format!("Failed to walk {}", directory.display()))?;
            let relative = entry.path().strip_prefix(directory)?.to_path_buf();
            let is_directory = entry.file_type().is_dir();
            entries.push((relative.clone(), is_directory));

            if !entry.file_type().is_file() {
                continue;
            }
            files_analyzed += 1;

            content.push_str(FILE_SEPARATOR);
            content.push('\n');
            content.push_str(&format!("FILE: {}\n", display_relative(&relative)));
            content.push_str(FILE_SEPARATOR);
            content.push('\n');
            content.push_str(&self.read_file_content(entry.path()));
            content.push_str("\n\n");
        }

        let root_name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| directory.display().to_string());
        let tree = TreeGenerator::generate_tree(&entries, &root_name);

        let mut summary = format!(
            "Directory: {root_name}\nFiles analyzed: {files_analyzed}\nGenerated: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        if self.estimate_tokens {
            if let Some(tokens) = estimate_tokens(&tree, &content) {
                summary.push_str(&format!("\nEstimated tokens: {}\n", format_tokens(tokens)));
            }
        }

        tracing::info!(
            "Generated digest for {} ({} files)",
            directory.display(),
            files_analyzed
        );
        Ok(Digest {
            summary,
            tree,
            content,
        })
    }
}

impl DirectoryDigester {
    fn read_file_content(&self, path: &Path) -> String {
        let metadata = match fs::metadata(path) {
            Ok(md) => md,
            Err(e) => return format!("Error reading file: {e}"),
        };
        if metadata.len() > self.max_file_size {
            return format!("[File too large: {} bytes]", metadata.len());
        }

        match probe_is_text(path) {
            Ok(true) => {}
            Ok(false) => return "[Non-text file]".to_string(),
            Err(e) => return format!("Error reading file: {e}"),
        }

        match fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => "[Non-text file]".to_string(),
            },
            Err(e) => format!("Error reading file: {e}"),
        }
    }
}

fn estimate_tokens(tree: &str, content: &str) -> Option<usize> {
    match tiktoken_rs::cl100k_base() {
        Ok(bpe) => Some(
            bpe.encode_with_special_tokens(tree).len()
                + bpe.encode_with_special_tokens(content).len(),
        ),
        Err(e) => {
            tracing::warn!("Token estimation unavailable: {}", e);
            None
        }
    }
}

fn format_tokens(tokens: usize) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}k", tokens as f64 / 1_000.0)
    } else {
        tokens.to_string()
    }
}

/// Joins path components with `/` regardless of platform.
pub fn display_relative(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds the final digest text.
///
/// Layout: `<codebase>\n\n{tree}\n\n{content}` followed, when any files were
/// unreadable, by an `# UNREADABLE FILES` section with one `- path` line per
/// file, and finally `</codebase>`.
pub fn assemble(tree_text: &str, content_text: &str, unreadable: &[PathBuf]) -> String {
    let mut content = content_text.to_string();
    if !unreadable.is_empty() {
        content.push_str("\n\n# UNREADABLE FILES\n");
        content.push_str(
            "The following files could not be read but are included for reference:\n\n",
        );
        for path in unreadable {
            content.push_str(&format!("- {}\n", display_relative(path)));
        }
    }
    format!("<codebase>\n\n{tree_text}\n\n{content}</codebase>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn assemble_without_unreadable_files() {
        let text = assemble("TREE", "CONTENT", &[]);
        assert_eq!(text, "<codebase>\n\nTREE\n\nCONTENT</codebase>");
    }

    #[test]
    fn assemble_appends_unreadable_section() {
        let text = assemble(
            "TREE",
            "CONTENT",
            &[PathBuf::from("img.png"), PathBuf::from("data").join("blob.bin")],
        );
        assert_eq!(
            text,
            "<codebase>\n\nTREE\n\nCONTENT\n\n# UNREADABLE FILES\n\
             The following files could not be read but are included for reference:\n\n\
             - img.png\n- data/blob.bin\n</codebase>"
        );
    }

    #[test]
    fn digester_renders_tree_and_file_blocks() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("repo");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.py"), "print('a')\n").unwrap();
        fs::write(root.join("img.png"), [0x89, b'P', b'N', b'G', 0xff]).unwrap();

        let digester = DirectoryDigester {
            estimate_tokens: false,
            ..Default::default()
        };
        let digest = digester.generate(&root).unwrap();

        assert_eq!(
            digest.tree,
            "Directory structure:\n└── repo/\n    ├── src/\n    │   └── a.py\n    └── img.png\n"
        );
        assert!(digest.content.contains("FILE: src/a.py\n"));
        assert!(digest.content.contains("print('a')\n"));
        assert!(digest.content.contains("FILE: img.png\n"));
        assert!(digest.content.contains("[Non-text file]"));
        assert!(digest.summary.starts_with("Directory: repo\nFiles analyzed: 2\n"));
    }

    #[test]
    fn digester_skips_content_of_large_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("big.txt"), "x".repeat(64)).unwrap();

        let digester = DirectoryDigester {
            max_file_size: 16,
            estimate_tokens: false,
        };
        let digest = digester.generate(dir.path()).unwrap();
        assert!(digest.content.contains("[File too large: 64 bytes]"));
    }

    #[test]
    fn digester_rejects_missing_directory() {
        let dir = tempdir().unwrap();
        let err = DirectoryDigester::default()
            .generate(&dir.path().join("missing"))
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn token_counts_are_abbreviated() {
        assert_eq!(format_tokens(950), "950");
        assert_eq!(format_tokens(12_345), "12.3k");
        assert_eq!(format_tokens(2_500_000), "2.5M");
    }
}
