use std::fmt;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

pub const ENV_OWNER: &str = "GITHUB_REPOSITORY_OWNER";
pub const ENV_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const ENV_RUN_ID: &str = "GITHUB_RUN_ID";

static REPO_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+$").expect("repository name pattern is valid")
});

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RepoNameError {
    #[error("repository identifier '{0}' is not of the form owner/repo")]
    MissingSlash(String),
    #[error("'{0}' is not a valid repository name")]
    InvalidName(String),
}

/// Short repository name, the part of `owner/repo` after the last slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoName(String);

impl RepoName {
    pub fn parse(full_name: &str) -> Result<Self, RepoNameError> {
        let (_, name) = full_name
            .rsplit_once('/')
            .ok_or_else(|| RepoNameError::MissingSlash(full_name.to_string()))?;
        if !REPO_NAME.is_match(name) {
            return Err(RepoNameError::InvalidName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the run being reported. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub owner: String,
    pub repository: RepoName,
    pub run_id: String,
}

/// Values given on the command line take precedence over the environment.
#[derive(Debug, Default, Clone)]
pub struct ContextOverrides {
    pub owner: Option<String>,
    pub repository: Option<String>,
    pub run_id: Option<String>,
}

impl RunContext {
    pub fn from_env(overrides: &ContextOverrides) -> Result<Self> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(overrides: &ContextOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |given: &Option<String>, key: &str| -> Result<String> {
            given
                .clone()
                .or_else(|| lookup(key))
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{key} is not set"))
        };

        let owner = resolve(&overrides.owner, ENV_OWNER)?;
        let full_name = resolve(&overrides.repository, ENV_REPOSITORY)?;
        let repository = RepoName::parse(&full_name)
            .with_context(|| format!("Resolving repository name from {ENV_REPOSITORY}"))?;
        let run_id = resolve(&overrides.run_id, ENV_RUN_ID)?;
        if !run_id.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("Run id '{run_id}' is not numeric");
        }

        Ok(Self {
            owner,
            repository,
            run_id,
        })
    }
}
