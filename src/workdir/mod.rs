//! Working directory provisioning
//!
//! Creates the destination directory and wipes it between clone attempts.
//! Wiping is best-effort: a directory that could not be fully cleared makes
//! the next clone fail loudly, so failures here are logged, not returned.

use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Result of a best-effort wipe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WipeSummary {
    /// Entries removed, including the root
    pub removed: usize,
    /// Entries that could not be removed
    pub failed: usize,
}

impl WipeSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Create `path` and its parents if missing
pub fn ensure_exists(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)?;

    debug!("Created working directory {:?}", path);
    Ok(())
}

/// Remove `path` and everything below it
pub fn wipe(path: &Path) -> WipeSummary {
    let mut summary = WipeSummary::default();

    if path.symlink_metadata().is_err() {
        return summary;
    }

    for entry in WalkDir::new(path).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to walk {:?}: {}", path, e);
                summary.failed += 1;
                continue;
            }
        };

        let result = if entry.file_type().is_dir() {
            std::fs::remove_dir(entry.path())
        } else {
            std::fs::remove_file(entry.path())
        };

        match result {
            Ok(()) => summary.removed += 1,
            Err(e) => {
                warn!("Failed to remove {:?}: {}", entry.path(), e);
                summary.failed += 1;
            }
        }
    }

    debug!(
        "Wiped {:?}: {} removed, {} failed",
        path, summary.removed, summary.failed
    );
    summary
}

/// True if `path` is absent or an empty directory
pub fn is_empty_dir(path: &Path) -> bool {
    match std::fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(e) => e.kind() == io::ErrorKind::NotFound,
    }
}
