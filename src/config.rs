use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::error::ConfigError;

pub(crate) const DEFAULT_TITLE: &str = "Reverse Pinboard";
pub(crate) const DEFAULT_PORT: u16 = 8080;
pub(crate) const DEFAULT_API_BASE: &str = "https://api.pinboard.in/v1/";
pub(crate) const DEFAULT_SYNC_INTERVAL_SECS: u64 = 10 * 60;

const POSTS_FILE: &str = "posts.json";
const UPDATED_FILE: &str = "updated";

/// Settings resolved once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) token: String,
    pub(crate) directory: PathBuf,
    pub(crate) title: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) port: u16,
    pub(crate) api_base: String,
    pub(crate) sync_interval: Duration,
}

impl Config {
    pub(crate) fn posts_path(&self) -> PathBuf {
        self.directory.join(POSTS_FILE)
    }

    pub(crate) fn marker_path(&self) -> PathBuf {
        self.directory.join(UPDATED_FILE)
    }
}

#[derive(Parser, Debug, Default)]
#[command(about = "Serve the unread part of a Pinboard account as a triage page")]
pub(crate) struct Args {
    /// Optional TOML file; flags and environment variables take precedence.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, env = "PINBOARD_TOKEN", hide_env_values = true)]
    pub(crate) token: Option<String>,
    #[arg(long, env = "DIRECTORY")]
    pub(crate) directory: Option<PathBuf>,
    #[arg(long, env = "TITLE")]
    pub(crate) title: Option<String>,
    #[arg(long, env = "USERNAME")]
    pub(crate) username: Option<String>,
    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
    #[arg(long, env = "PORT")]
    pub(crate) port: Option<u16>,
    #[arg(long, env = "PINBOARD_API")]
    pub(crate) api_base: Option<String>,
    #[arg(long, env = "SYNC_INTERVAL_SECONDS")]
    pub(crate) sync_interval_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
    token: Option<String>,
    directory: Option<PathBuf>,
    title: Option<String>,
    username: Option<String>,
    password: Option<String>,
    port: Option<u16>,
    api_base: Option<String>,
    sync_interval_seconds: Option<u64>,
}

pub(crate) fn load_config(args: &Args) -> Result<Config, ConfigError> {
    let file = match &args.config {
        Some(path) => read_config_file(path)?,
        None => ConfigFile::default(),
    };
    resolve_config(args, file)
}

pub(crate) fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn resolve_config(args: &Args, file: ConfigFile) -> Result<Config, ConfigError> {
    let token = required("PINBOARD_TOKEN", args.token.clone().or(file.token))?;
    let directory = args
        .directory
        .clone()
        .or(file.directory)
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or(ConfigError::Missing("DIRECTORY"))?;
    let username = required("USERNAME", args.username.clone().or(file.username))?;
    let password = required("PASSWORD", args.password.clone().or(file.password))?;

    let title = non_empty(args.title.clone().or(file.title))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);

    let mut api_base = non_empty(args.api_base.clone().or(file.api_base))
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    if !api_base.ends_with('/') {
        api_base.push('/');
    }

    let interval_secs = args
        .sync_interval_seconds
        .or(file.sync_interval_seconds)
        .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS);
    if interval_secs == 0 {
        return Err(ConfigError::Invalid {
            key: "SYNC_INTERVAL_SECONDS",
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(Config {
        token,
        directory,
        title,
        username,
        password,
        port,
        api_base,
        sync_interval: Duration::from_secs(interval_secs),
    })
}

fn required(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    non_empty(value).ok_or(ConfigError::Missing(key))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
