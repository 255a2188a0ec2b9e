//! Shared setup for unit tests.

use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Installs a test-writer tracing subscriber once per test binary.
///
/// `RUST_LOG` controls the filter, so `RUST_LOG=codebase_digest=debug`
/// shows collapse and exclusion decisions next to the failing assertion.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Returns true when unreadable-file tests cannot work because the
/// process runs as root (UID 0) and ignores permission bits.
#[cfg(any(test, doctest))]
pub fn permission_tests_unsupported(test_name: &str) -> bool {
    #[cfg(unix)]
    let as_root = {
        // SAFETY: geteuid has no side effects.
        unsafe { libc::geteuid() == 0 }
    };
    #[cfg(not(unix))]
    let as_root = true;

    if as_root {
        tracing::info!("Skipping {}: permission bits are not enforced", test_name);
    }
    as_root
}

/// Removes all permissions from a path and restores `restore_mode` on drop,
/// so a failing assertion never leaves an undeletable temp directory behind.
#[cfg(all(unix, any(test, doctest)))]
pub struct Locked {
    path: std::path::PathBuf,
    restore_mode: u32,
}

#[cfg(all(unix, any(test, doctest)))]
impl Locked {
    pub fn new(path: impl Into<std::path::PathBuf>, restore_mode: u32) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let path = path.into();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000))
            .expect("Failed to lock test path");
        Self { path, restore_mode }
    }
}

#[cfg(all(unix, any(test, doctest)))]
impl Drop for Locked {
    fn drop(&mut self) {
        use std::os::unix::fs::PermissionsExt;

        let _ = std::fs::set_permissions(
            &self.path,
            std::fs::Permissions::from_mode(self.restore_mode),
        );
    }
}
