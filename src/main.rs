use std::env;
use std::ffi::OsString;

use tracing::error;

use worker_entrypoint::config::LauncherConfig;
use worker_entrypoint::error::LaunchError;
use worker_entrypoint::launcher::{LaunchPlan, read_token};
use worker_entrypoint::logging;

// No flag parsing here: every argument belongs to the worker.
fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32, LaunchError> {
    let config = LauncherConfig::from_env().map_err(LaunchError::Config)?;
    let token = read_token(&config.token_vars, |name| env::var_os(name))?;
    let forwarded: Vec<OsString> = env::args_os().skip(1).collect();
    LaunchPlan::new(&config, token, forwarded).execute()
}
