use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

/// Environment variable naming the filestore mount.
pub const MOUNT_PATH_ENV_VAR: &str = "FILERESTORE_MOUNT_PATH";
/// Mount used by the dataset worker when nothing else is configured.
pub const DEFAULT_MOUNT_PATH: &str = "/mnt/filestore";

/// Entry that could not be removed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of emptying a mount.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SweepReport {
    pub mount_path: PathBuf,
    pub dry_run: bool,
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<SweepFailure>,
}

/// Removes every direct entry of `mount_path`, keeping the directory itself.
///
/// Directories are removed recursively; files and symlinks are unlinked and
/// symlinks are never followed. A failing entry is recorded and the sweep
/// moves on. Only failing to list `mount_path` is an error.
pub fn sweep(mount_path: &Path, dry_run: bool) -> Result<SweepReport> {
    let entries = fs::read_dir(mount_path)
        .with_context(|| format!("failed to list filestore mount {}", mount_path.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| {
            format!("failed to read entry under {}", mount_path.display())
        })?;
        paths.push(entry.path());
    }
    paths.sort();

    let mut report = SweepReport {
        mount_path: mount_path.to_path_buf(),
        dry_run,
        ..SweepReport::default()
    };

    for path in paths {
        if dry_run {
            info!(path = %path.display(), "would delete");
            report.deleted.push(path);
            continue;
        }
        match remove_entry(&path) {
            Ok(()) => {
                info!(path = %path.display(), "deleted");
                report.deleted.push(path);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to delete");
                report.failed.push(SweepFailure {
                    path,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(report)
}

fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
