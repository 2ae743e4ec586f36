#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

pub const BIN: &str = "worker-entrypoint";

/// Variables that would leak settings from the developer's shell into a run.
const INHERITED_VARS: &[&str] = &[
    "HF_TOKEN",
    "HF_HUB_TOKEN",
    "WORKER_ENTRYPOINT_CONFIG",
    "WORKER_ENTRYPOINT_LOGIN_COMMAND",
    "WORKER_ENTRYPOINT_WORKER_COMMAND",
    "WORKER_ENTRYPOINT_TOKEN_VARS",
    "FAKE_LOGIN_EXIT",
    "FAKE_WORKER_EXIT",
    "FAKE_WORKER_PID_FILE",
];

pub const FAKE_LOGIN_SCRIPT: &str = r#"#!/bin/sh
{
  printf 'login'
  for arg in "$@"; do printf ' [%s]' "$arg"; done
  printf '\n'
} >> "$FAKE_EVENTS_LOG"
exit "${FAKE_LOGIN_EXIT:-0}"
"#;

pub const FAKE_WORKER_SCRIPT: &str = r#"#!/bin/sh
{
  printf 'worker'
  for arg in "$@"; do printf ' [%s]' "$arg"; done
  printf '\n'
} >> "$FAKE_EVENTS_LOG"
if [ -n "$FAKE_WORKER_PID_FILE" ]; then
  echo $$ > "$FAKE_WORKER_PID_FILE"
fi
exit "${FAKE_WORKER_EXIT:-0}"
"#;

/// Fake login and worker programs that record every call in one events file.
pub struct Fixture {
    pub bin_dir: PathBuf,
    pub events_log: PathBuf,
}

impl Fixture {
    pub fn new(root: &Path) -> Self {
        let bin_dir = root.join("bin");
        fs::create_dir_all(&bin_dir).expect("create fake bin dir");
        write_script(&bin_dir.join("fake-login"), FAKE_LOGIN_SCRIPT);
        write_script(&bin_dir.join("fake-worker"), FAKE_WORKER_SCRIPT);
        Self {
            bin_dir,
            events_log: root.join("events.log"),
        }
    }

    pub fn login_path(&self) -> PathBuf {
        self.bin_dir.join("fake-login")
    }

    pub fn worker_path(&self) -> PathBuf {
        self.bin_dir.join("fake-worker")
    }

    /// Entrypoint command wired to the fakes with a clean environment.
    pub fn entrypoint(&self) -> Command {
        let mut cmd = Command::cargo_bin(BIN).expect("binary should build");
        for var in INHERITED_VARS {
            cmd.env_remove(var);
        }
        cmd.env(
            "WORKER_ENTRYPOINT_LOGIN_COMMAND",
            format!("'{}' --token", self.login_path().display()),
        );
        cmd.env(
            "WORKER_ENTRYPOINT_WORKER_COMMAND",
            format!("'{}'", self.worker_path().display()),
        );
        cmd.env("FAKE_EVENTS_LOG", &self.events_log);
        cmd
    }

    /// Recorded calls in order, e.g. `login [--token] [tok123]`.
    pub fn events(&self) -> Vec<String> {
        match fs::read_to_string(&self.events_log) {
            Ok(contents) => contents.lines().map(str::to_string).collect(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => panic!("failed to read events log: {err}"),
        }
    }

    pub fn login_calls(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|line| line.starts_with("login"))
            .collect()
    }

    pub fn worker_calls(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|line| line.starts_with("worker"))
            .collect()
    }
}

pub fn write_script(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write fake script");
    let mut permissions = fs::metadata(path)
        .expect("script metadata")
        .permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).expect("set script permissions");
}
