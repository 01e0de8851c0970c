use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::{Source, DEFAULT_API_URL};
use crate::context::RunContext;

const API_VERSION: &str = "2022-11-28";
/// GitHub caps the jobs listing at 100 entries per page.
const JOBS_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeadCommit {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowRun {
    pub triggering_actor: Actor,
    pub head_branch: Option<String>,
    pub event: String,
    pub head_commit: HeadCommit,
    pub html_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    #[serde(other)]
    Other,
}

/// Terminal outcome of a job or step. Values GitHub adds later are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    Neutral,
    TimedOut,
    ActionRequired,
    Other(String),
}

impl From<String> for Conclusion {
    fn from(value: String) -> Self {
        match value.as_str() {
            "success" => Conclusion::Success,
            "failure" => Conclusion::Failure,
            "cancelled" => Conclusion::Cancelled,
            "skipped" => Conclusion::Skipped,
            "neutral" => Conclusion::Neutral,
            "timed_out" => Conclusion::TimedOut,
            "action_required" => Conclusion::ActionRequired,
            _ => Conclusion::Other(value),
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
            Conclusion::Cancelled => "cancelled",
            Conclusion::Skipped => "skipped",
            Conclusion::Neutral => "neutral",
            Conclusion::TimedOut => "timed_out",
            Conclusion::ActionRequired => "action_required",
            Conclusion::Other(raw) => raw,
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    pub name: String,
    pub conclusion: Option<Conclusion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobSummary {
    pub name: String,
    pub status: JobStatus,
    pub conclusion: Option<Conclusion>,
    pub html_url: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct JobList {
    total_count: usize,
    jobs: Vec<JobSummary>,
}

impl JobList {
    fn into_first_page(self, ctx: &RunContext) -> Vec<JobSummary> {
        if self.total_count > self.jobs.len() {
            tracing::warn!(
                "Run {} has {} jobs, only the first {} are reported",
                ctx.run_id,
                self.total_count,
                self.jobs.len()
            );
        }
        self.jobs
    }
}

#[async_trait]
pub trait RunSource: Send + Sync {
    /// First page of jobs belonging to the run.
    async fn fetch_jobs(&self, ctx: &RunContext) -> Result<Vec<JobSummary>>;

    async fn fetch_run(&self, ctx: &RunContext) -> Result<WorkflowRun>;
}

pub fn source_from_config(source: &Source, token: Option<&str>) -> Result<Box<dyn RunSource>> {
    match source {
        Source::Github { api_url } => {
            let token = token.context("GITHUB_TOKEN is not set")?;
            let api_url = api_url.as_deref().unwrap_or(DEFAULT_API_URL);
            Ok(Box::new(GitHubSource::new(api_url, token)?))
        }
        Source::Mock { path } => Ok(Box::new(MockSource { root: path.clone() })),
    }
}

pub struct GitHubSource {
    client: reqwest::Client,
    api_url: String,
}

impl GitHubSource {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("GITHUB_TOKEN contains invalid header characters")?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("actions-notify/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Building GitHub HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn run_url(&self, ctx: &RunContext) -> String {
        format!(
            "{}/repos/{}/{}/actions/runs/{}",
            self.api_url, ctx.owner, ctx.repository, ctx.run_id
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {url}");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Requesting {url}"))?
            .error_for_status()
            .with_context(|| "GitHub API error")?;
        resp.json::<T>()
            .await
            .with_context(|| format!("Decoding response from {url}"))
    }
}

#[async_trait]
impl RunSource for GitHubSource {
    async fn fetch_jobs(&self, ctx: &RunContext) -> Result<Vec<JobSummary>> {
        let url = format!("{}/jobs?per_page={JOBS_PER_PAGE}", self.run_url(ctx));
        let list: JobList = self.get_json(&url).await?;
        Ok(list.into_first_page(ctx))
    }

    async fn fetch_run(&self, ctx: &RunContext) -> Result<WorkflowRun> {
        self.get_json(&self.run_url(ctx)).await
    }
}

/// Serves a run from `run.json` and `jobs.json`, shaped like the GitHub responses.
pub struct MockSource {
    root: PathBuf,
}

impl MockSource {
    async fn read<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.root.join(file);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Mock response file not found: {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("Parsing {}", path.display()))
    }
}

#[async_trait]
impl RunSource for MockSource {
    async fn fetch_jobs(&self, ctx: &RunContext) -> Result<Vec<JobSummary>> {
        let list: JobList = self.read("jobs.json").await?;
        Ok(list.into_first_page(ctx))
    }

    async fn fetch_run(&self, _ctx: &RunContext) -> Result<WorkflowRun> {
        self.read("run.json").await
    }
}
