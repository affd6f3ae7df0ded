//! Symlinks from the unified store back into the source datasets.

use log::{debug, error, warn};
use std::fs;
use std::io;
use std::path::Path;

use crate::types::ProcessingStats;
use crate::utils::relative_path;

/// Result of a single link attempt. None of these abort the run.
#[derive(Debug)]
pub enum LinkOutcome {
    Created,
    /// Something already occupies the destination; it was left alone.
    AlreadyExists,
    /// The file the link should point at does not exist.
    MissingSource,
    Failed(io::Error),
}

impl LinkOutcome {
    pub fn is_linked(&self) -> bool {
        matches!(self, LinkOutcome::Created | LinkOutcome::AlreadyExists)
    }
}

/// Create `dst_dir/dst_name` as a relative symlink to `src`.
pub fn link_reference(src: &Path, dst_dir: &Path, dst_name: &str) -> LinkOutcome {
    let dst = dst_dir.join(dst_name);

    if !src.exists() {
        warn!("Source not found: {}", src.display());
        return LinkOutcome::MissingSource;
    }
    // symlink_metadata also catches dangling links left by earlier runs
    if fs::symlink_metadata(&dst).is_ok() {
        warn!("Symlink already exists: {}", dst.display());
        return LinkOutcome::AlreadyExists;
    }

    let target = match relative_path(dst_dir, src) {
        Ok(target) => target,
        Err(e) => {
            error!("Failed to resolve {} from {}: {}", src.display(), dst_dir.display(), e);
            return LinkOutcome::Failed(e);
        }
    };

    match symlink_file(&target, &dst) {
        Ok(()) => {
            debug!("Linked {} -> {}", dst.display(), target.display());
            LinkOutcome::Created
        }
        Err(e) => {
            error!("Failed to create symlink {}: {}", dst.display(), e);
            LinkOutcome::Failed(e)
        }
    }
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Link `{id}.{src_ext}` from `src_dir` into `dst_dir` as `{id}.{dst_ext}`.
pub fn link_with_extension(
    src_dir: &Path,
    dst_dir: &Path,
    id: &str,
    src_ext: &str,
    dst_ext: &str,
    stats: &mut ProcessingStats,
) -> LinkOutcome {
    let src = src_dir.join(format!("{}.{}", id, src_ext));
    let outcome = link_reference(&src, dst_dir, &format!("{}.{}", id, dst_ext));
    stats.record_link(&outcome);
    outcome
}
