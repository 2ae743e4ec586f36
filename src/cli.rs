use std::path::PathBuf;

use clap::Parser;

use crate::filestore::{DEFAULT_MOUNT_PATH, MOUNT_PATH_ENV_VAR};

/// CLI definition for the `filestore-gc` binary.
#[derive(Debug, Parser)]
#[command(
    name = "filestore-gc",
    about = "Empty the shared filestore mount between dataset jobs",
    author,
    version
)]
pub struct GcCli {
    /// Directory whose contents should be deleted.
    #[arg(
        long = "mount-path",
        value_name = "DIR",
        env = MOUNT_PATH_ENV_VAR,
        default_value = DEFAULT_MOUNT_PATH
    )]
    pub mount_path: PathBuf,
    /// List what would be deleted without touching anything.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Emit a machine-readable JSON report on stdout.
    #[arg(long)]
    pub json: bool,
}
