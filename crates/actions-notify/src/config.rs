use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_CONFIG_NAME: &str = "actions-notify.toml";

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

const ENV_TOKEN: &str = "GITHUB_TOKEN";
const ENV_API_URL: &str = "GITHUB_API_URL";
const ENV_SERVER_URL: &str = "GITHUB_SERVER_URL";
const ENV_WEBHOOK: &str = "SLACK_WEBHOOK_URL";
/// How the Actions runner exposes the `slack-webhook` input.
const ENV_WEBHOOK_INPUT: &str = "INPUT_SLACK-WEBHOOK";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Web host used for commit and avatar links
    pub server_url: Option<String>,
    pub source: Option<Source>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum Source {
    Github {
        api_url: Option<String>,
    },
    /// Canned `run.json` / `jobs.json` responses read from a directory.
    Mock {
        path: PathBuf,
    },
}

impl Config {
    /// Load configuration from an explicit path, or search upward from current dir.
    /// Without an explicit path a missing file yields the defaults.
    pub fn load(path_override: Option<PathBuf>) -> Result<Self> {
        let path = match path_override {
            Some(p) => p,
            None => match find_upwards(DEFAULT_CONFIG_NAME) {
                Some(p) => p,
                None => {
                    tracing::debug!("No {DEFAULT_CONFIG_NAME} found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Parsing TOML config {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(cfg)
    }
}

/// Everything the pipeline needs besides the run identity, after merging the
/// config file over the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: Source,
    pub server_url: String,
    pub token: Option<String>,
    pub webhook_url: Option<String>,
}

impl Settings {
    pub fn from_env(config: Config) -> Self {
        Self::resolve(config, |key| std::env::var(key).ok())
    }

    pub fn resolve<F>(config: Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v: &String| !v.is_empty());

        let source = match config.source {
            Some(mock @ Source::Mock { .. }) => mock,
            Some(github @ Source::Github { api_url: Some(_) }) => github,
            Some(Source::Github { api_url: None }) | None => Source::Github {
                api_url: Some(lookup(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string())),
            },
        };
        let server_url = config
            .server_url
            .or_else(|| lookup(ENV_SERVER_URL))
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        Self {
            source,
            server_url: server_url.trim_end_matches('/').to_string(),
            token: lookup(ENV_TOKEN),
            webhook_url: lookup(ENV_WEBHOOK).or_else(|| lookup(ENV_WEBHOOK_INPUT)),
        }
    }

    pub fn webhook_url(&self) -> Result<&str> {
        self.webhook_url
            .as_deref()
            .with_context(|| format!("No webhook configured: set {ENV_WEBHOOK} or the slack-webhook input"))
    }
}

fn find_upwards(file_name: &str) -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(file_name);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}
