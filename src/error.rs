use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Exit code used when a program could not be found.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit code used when a program exists but could not be executed.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Exit code used when the launcher configuration is invalid.
pub const EXIT_CONFIG: i32 = 2;

/// Reasons the launcher stops before (or instead of) becoming the worker.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid launcher configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("token variable {var} is set but is not valid UTF-8")]
    TokenEncoding { var: String },

    #[error("failed to start login command `{program}`: {source}")]
    LoginSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("login command `{program}` exited with {status}")]
    LoginFailed { program: String, status: ExitStatus },

    #[error("failed to start worker `{program}`: {source}")]
    WorkerStart {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    /// Process exit code the launcher should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::Config(_) | LaunchError::TokenEncoding { .. } => EXIT_CONFIG,
            LaunchError::LoginSpawn { source, .. } | LaunchError::WorkerStart { source, .. } => {
                spawn_error_code(source)
            }
            LaunchError::LoginFailed { status, .. } => status_code(*status),
        }
    }
}

/// Maps a finished child's status to the code a POSIX shell would report.
pub fn status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

fn spawn_error_code(err: &io::Error) -> i32 {
    if err.kind() == io::ErrorKind::NotFound {
        EXIT_NOT_FOUND
    } else {
        EXIT_NOT_EXECUTABLE
    }
}
