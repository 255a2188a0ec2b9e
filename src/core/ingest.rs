//! The "create ingest" operation: materialize, digest, scan, assemble.

use std::path::PathBuf;

use super::digest::{assemble, DigestGenerator};
use super::error::CoreError;
use super::materializer::{materialize, MaterializeStats};
use super::selection::SelectionTree;
use super::unreadable::scan_unreadable;

const SCRATCH_PREFIX: &str = "codebase-digest-";

/// Result of a successful ingest.
#[derive(Debug, Clone)]
pub struct IngestOutput {
    /// The final `<codebase>` text.
    pub text: String,
    /// The generator's summary block (not part of `text`).
    pub summary: String,
    pub unreadable: Vec<PathBuf>,
    pub stats: MaterializeStats,
}

/// Runs one ingest for the checked part of `tree`.
///
/// The scratch directory is created right before materialization and is
/// removed when this function returns, on success and on every error path.
/// Nothing is retried.
pub fn create_ingest<G>(tree: &SelectionTree, generator: &G) -> Result<IngestOutput, CoreError>
where
    G: DigestGenerator + ?Sized,
{
    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir()
        .map_err(|e| CoreError::io(e, std::env::temp_dir()))?;

    // Materialize under the project's own name so the digest shows it.
    let scratch_root = scratch.path().join(&tree.node(tree.root()).name);

    let result = (|| -> Result<IngestOutput, CoreError> {
        let stats = materialize(tree, &scratch_root)?;

        let digest = generator
            .generate(&scratch_root)
            .map_err(|e| CoreError::Ingest(e.to_string()))?;
        let unreadable = scan_unreadable(&scratch_root)?;
        let text = assemble(&digest.tree, &digest.content, &unreadable);

        Ok(IngestOutput {
            text,
            summary: digest.summary,
            unreadable,
            stats,
        })
    })();

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        tracing::warn!(
            "Failed to remove scratch directory {}: {}",
            scratch_path.display(),
            e
        );
    }

    if let Err(e) = &result {
        tracing::error!("Ingest failed: {}", e);
    }
    result
}
