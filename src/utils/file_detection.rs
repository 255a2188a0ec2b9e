use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes inspected when deciding whether a file decodes as text.
pub const TEXT_PROBE_BYTES: u64 = 1024;

/// Extensions treated as unreadable without opening the file.
const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "gif", "zip", "exe", "dll", "bin", "dat", "db", "sqlite",
    // compiled artifacts
    "pyc", "pyo", "so", "o", "a", "lib", "dylib",
];

/// Checks the extension against the known-binary list (case-insensitive).
pub fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            BINARY_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

/// Reads the first [`TEXT_PROBE_BYTES`] of a file and checks they are UTF-8.
///
/// A multi-byte sequence cut off at the end of the probe is not an error.
pub fn probe_is_text(path: &Path) -> io::Result<bool> {
    let mut buffer = Vec::with_capacity(TEXT_PROBE_BYTES as usize);
    File::open(path)?
        .take(TEXT_PROBE_BYTES)
        .read_to_end(&mut buffer)?;

    Ok(match std::str::from_utf8(&buffer) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    })
}

/// Whether a file should be listed as unreadable in the digest.
///
/// True for known binary extensions, for content that does not decode as
/// UTF-8, and for files that cannot be opened or read at all.
pub fn is_unreadable(path: &Path) -> bool {
    if has_binary_extension(path) {
        return true;
    }
    match probe_is_text(path) {
        Ok(is_text) => !is_text,
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", path.display(), e);
            true
        }
    }
}
