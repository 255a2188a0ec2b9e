//! An abstraction over the clipboard so the "copy result" command can be
//! driven without a desktop session.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

/// Receives the final digest text.
pub trait ClipboardService: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Writes the digest to standard output.
pub struct StdoutClipboard;

impl ClipboardService for StdoutClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}").context("Failed to write digest to stdout")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Writes the digest to a file, replacing any previous content.
pub struct FileClipboard {
    pub path: PathBuf,
}

impl ClipboardService for FileClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        std::fs::write(&self.path, text)
            .with_context(|| format!("Failed to write digest to {}", self.path.display()))?;
        tracing::info!("Wrote digest to {}", self.path.display());
        Ok(())
    }
}
