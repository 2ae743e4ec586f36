use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, ensure};
use serde::Deserialize;

/// Names a TOML file with launcher settings.
pub const CONFIG_ENV_VAR: &str = "WORKER_ENTRYPOINT_CONFIG";
/// Overrides the login command line.
pub const LOGIN_COMMAND_ENV_VAR: &str = "WORKER_ENTRYPOINT_LOGIN_COMMAND";
/// Overrides the worker command line.
pub const WORKER_COMMAND_ENV_VAR: &str = "WORKER_ENTRYPOINT_WORKER_COMMAND";
/// Overrides the comma separated list of token variables.
pub const TOKEN_VARS_ENV_VAR: &str = "WORKER_ENTRYPOINT_TOKEN_VARS";

const DEFAULT_TOKEN_VARS: &[&str] = &["HF_TOKEN", "HF_HUB_TOKEN"];
const DEFAULT_LOGIN_COMMAND: &[&str] = &["huggingface-cli", "login", "--token"];
const DEFAULT_WORKER_COMMAND: &[&str] = &["python", "main.py"];

/// A program followed by the arguments that always precede caller-supplied ones.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Splits a shell-style command string into program and leading arguments.
    pub fn parse(raw: &str) -> Result<Self> {
        let words = shlex::split(raw)
            .ok_or_else(|| anyhow!("unbalanced quoting in command `{raw}`"))?;
        Self::from_words(words).with_context(|| format!("invalid command `{raw}`"))
    }

    fn from_words(words: Vec<String>) -> Result<Self> {
        let mut words = words.into_iter();
        let program = words
            .next()
            .filter(|program| !program.is_empty())
            .ok_or_else(|| anyhow!("command must name a program"))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    fn from_static(words: &[&str]) -> Self {
        Self {
            program: words[0].to_string(),
            args: words[1..].iter().map(|word| word.to_string()).collect(),
        }
    }
}

/// Resolved settings for one launcher run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LauncherConfig {
    /// Variables consulted in order for the credential token.
    pub token_vars: Vec<String>,
    pub login_command: CommandLine,
    pub worker_command: CommandLine,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            token_vars: DEFAULT_TOKEN_VARS.iter().map(|v| v.to_string()).collect(),
            login_command: CommandLine::from_static(DEFAULT_LOGIN_COMMAND),
            worker_command: CommandLine::from_static(DEFAULT_WORKER_COMMAND),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    token_vars: Option<Vec<String>>,
    login_command: Option<String>,
    worker_command: Option<String>,
}

impl LauncherConfig {
    /// Builds the configuration from defaults, the optional config file and
    /// environment overrides, in that order.
    pub fn from_env() -> Result<Self> {
        Self::resolve(|name| env::var(name).ok())
    }

    /// Same as [`LauncherConfig::from_env`] but reads variables through `lookup`.
    pub fn resolve<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
            let file = read_config_file(Path::new(&path))?;
            config.apply_file(file)?;
        }

        if let Some(raw) = lookup(LOGIN_COMMAND_ENV_VAR).filter(|value| !value.is_empty()) {
            config.login_command = CommandLine::parse(&raw)
                .with_context(|| format!("failed to parse {LOGIN_COMMAND_ENV_VAR}"))?;
        }
        if let Some(raw) = lookup(WORKER_COMMAND_ENV_VAR).filter(|value| !value.is_empty()) {
            config.worker_command = CommandLine::parse(&raw)
                .with_context(|| format!("failed to parse {WORKER_COMMAND_ENV_VAR}"))?;
        }
        if let Some(raw) = lookup(TOKEN_VARS_ENV_VAR).filter(|value| !value.is_empty()) {
            config.token_vars = split_token_vars(&raw);
        }

        ensure!(
            !config.token_vars.is_empty(),
            "at least one token variable name must be configured"
        );
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(vars) = file.token_vars {
            self.token_vars = vars
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
        }
        if let Some(raw) = file.login_command {
            self.login_command =
                CommandLine::parse(&raw).context("failed to parse `login_command`")?;
        }
        if let Some(raw) = file.worker_command {
            self.worker_command =
                CommandLine::parse(&raw).context("failed to parse `worker_command`")?;
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let path = make_absolute(path.to_path_buf())?;
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn split_token_vars(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn make_absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = env::current_dir().context("failed to resolve current working directory")?;
        Ok(cwd.join(path))
    }
}
