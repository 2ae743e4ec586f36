use std::ffi::OsString;
use std::fmt;
use std::process::Command;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::config::{CommandLine, LauncherConfig};
use crate::error::LaunchError;

/// Reads the first non-empty credential token among `vars` using `lookup`.
///
/// A non-empty value that is not valid UTF-8 is an error rather than a skip.
pub fn read_token<F>(
    vars: &[String],
    lookup: F,
) -> Result<Option<(String, SecretString)>, LaunchError>
where
    F: Fn(&str) -> Option<OsString>,
{
    for name in vars {
        let Some(value) = lookup(name.as_str()).filter(|value| !value.is_empty()) else {
            continue;
        };
        let value = value
            .into_string()
            .map_err(|_| LaunchError::TokenEncoding { var: name.clone() })?;
        return Ok(Some((name.clone(), SecretString::from(value))));
    }
    Ok(None)
}

/// One-shot authentication call carrying the credential token.
pub struct LoginStep {
    pub command: CommandLine,
    /// Variable the token was read from, for diagnostics.
    pub source_var: String,
    token: SecretString,
}

impl LoginStep {
    /// Login invocation with the token as its final argument.
    fn build(&self) -> Command {
        let mut command = Command::new(&self.command.program);
        command.args(&self.command.args);
        command.arg(self.token.expose_secret());
        command
    }
}

impl fmt::Debug for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginStep")
            .field("command", &self.command)
            .field("source_var", &self.source_var)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// The worker program with the caller's arguments appended verbatim.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkerStep {
    pub command: CommandLine,
    pub forwarded: Vec<OsString>,
}

impl WorkerStep {
    /// Full argument vector after the program name.
    pub fn argv(&self) -> Vec<OsString> {
        self.command
            .args
            .iter()
            .map(OsString::from)
            .chain(self.forwarded.iter().cloned())
            .collect()
    }

    fn build(&self) -> Command {
        let mut command = Command::new(&self.command.program);
        command.args(self.argv());
        command
    }
}

/// Everything the launcher will do, in order.
#[derive(Debug)]
pub struct LaunchPlan {
    pub login: Option<LoginStep>,
    pub worker: WorkerStep,
}

impl LaunchPlan {
    /// Builds the plan from resolved configuration, the optional token and
    /// the arguments the launcher itself received.
    pub fn new(
        config: &LauncherConfig,
        token: Option<(String, SecretString)>,
        forwarded: Vec<OsString>,
    ) -> Self {
        let login = token.map(|(source_var, token)| LoginStep {
            command: config.login_command.clone(),
            source_var,
            token,
        });
        Self {
            login,
            worker: WorkerStep {
                command: config.worker_command.clone(),
                forwarded,
            },
        }
    }

    /// Runs the login step if present, then hands the process over to the
    /// worker. Only returns when something went wrong, or on platforms where
    /// the worker has to run as a child.
    pub fn execute(self) -> Result<i32, LaunchError> {
        let LaunchPlan { login, worker } = self;

        match login {
            Some(step) => {
                run_login(&step)?;
                // The token must not outlive the login step.
                drop(step);
            }
            None => debug!("no credential token set; skipping login"),
        }

        info!(
            program = %worker.command.program,
            args = worker.argv().len(),
            "starting worker"
        );
        hand_over(&worker)
    }
}

fn run_login(step: &LoginStep) -> Result<(), LaunchError> {
    info!(
        program = %step.command.program,
        token_var = %step.source_var,
        "authenticating with model hub"
    );
    let status = step
        .build()
        .status()
        .map_err(|source| LaunchError::LoginSpawn {
            program: step.command.program.clone(),
            source,
        })?;
    if !status.success() {
        return Err(LaunchError::LoginFailed {
            program: step.command.program.clone(),
            status,
        });
    }
    info!("login succeeded");
    Ok(())
}

#[cfg(unix)]
fn hand_over(worker: &WorkerStep) -> Result<i32, LaunchError> {
    use std::os::unix::process::CommandExt;

    // exec only returns on failure.
    let source = worker.build().exec();
    Err(LaunchError::WorkerStart {
        program: worker.command.program.clone(),
        source,
    })
}

#[cfg(not(unix))]
fn hand_over(worker: &WorkerStep) -> Result<i32, LaunchError> {
    let status = worker
        .build()
        .status()
        .map_err(|source| LaunchError::WorkerStart {
            program: worker.command.program.clone(),
            source,
        })?;
    Ok(crate::error::status_code(status))
}
