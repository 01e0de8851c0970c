//! Slack Block Kit payload for a finished workflow run.

use serde::Serialize;

use crate::context::RunContext;
use crate::github::{Conclusion, JobStatus, JobSummary, Step, WorkflowRun};

const BUTTON_VALUE: &str = "click_me_123";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub username: String,
    pub icon_url: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fields: Option<Vec<Text>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<Button>,
    },
    Divider,
    Actions {
        elements: Vec<Button>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    Mrkdwn {
        text: String,
    },
    PlainText {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        emoji: Option<bool>,
    },
}

impl Text {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Text::Mrkdwn { text: text.into() }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Text::PlainText {
            text: text.into(),
            emoji: None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Text::Mrkdwn { text } | Text::PlainText { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "button")]
pub struct Button {
    pub text: Text,
    pub value: String,
    pub url: String,
}

impl Button {
    fn link(label: Text, url: impl Into<String>) -> Self {
        Self {
            text: label,
            value: BUTTON_VALUE.to_string(),
            url: url.into(),
        }
    }
}

/// Where links in the message point to.
#[derive(Debug, Clone)]
pub struct MessageContext<'a> {
    pub run: &'a RunContext,
    /// Web host, e.g. `https://github.com`, without trailing slash
    pub server_url: &'a str,
}

impl MessageContext<'_> {
    fn commit_url(&self, sha: &str) -> String {
        format!(
            "{}/{}/{}/commit/{}",
            self.server_url, self.run.owner, self.run.repository, sha
        )
    }

    fn avatar_url(&self, login: &str) -> String {
        format!("{}/{}.png?size=32", self.server_url, login)
    }
}

/// First step of the job that concluded with a failure.
pub fn failed_step(job: &JobSummary) -> Option<&Step> {
    job.steps
        .iter()
        .find(|s| s.conclusion == Some(Conclusion::Failure))
}

/// Failed step reported for a job; only jobs that concluded with a failure carry one.
pub fn reported_failed_step(job: &JobSummary) -> Option<&Step> {
    if job.conclusion == Some(Conclusion::Failure) {
        failed_step(job)
    } else {
        None
    }
}

fn status_icon(conclusion: Option<&Conclusion>) -> &'static str {
    if conclusion == Some(&Conclusion::Success) {
        "✅"
    } else {
        "❌"
    }
}

pub fn conclusion_label(conclusion: Option<&Conclusion>) -> String {
    conclusion.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

/// Jobs that have finished; queued and running jobs are left out of the report.
pub fn completed_jobs(jobs: &[JobSummary]) -> impl Iterator<Item = &JobSummary> {
    jobs.iter().filter(|j| j.status == JobStatus::Completed)
}

fn job_block(job: &JobSummary) -> Block {
    let mut text = format!(
        "*{}*\n{} {}",
        job.name,
        status_icon(job.conclusion.as_ref()),
        conclusion_label(job.conclusion.as_ref())
    );
    match reported_failed_step(job) {
        Some(step) => text.push_str(&format!("\n> Failed on: {}", step.name)),
        None if job.conclusion == Some(Conclusion::Failure) => {
            tracing::debug!("Job '{}' failed without a failed step", job.name)
        }
        None => {}
    }

    Block::Section {
        text: Some(Text::mrkdwn(text)),
        fields: None,
        accessory: Some(Button::link(
            Text::PlainText {
                text: "View Logs".to_string(),
                emoji: Some(true),
            },
            job.html_url.clone(),
        )),
    }
}

pub fn build_message(ctx: &MessageContext<'_>, run: &WorkflowRun, jobs: &[JobSummary]) -> Message {
    let login = &run.triggering_actor.login;
    let branch = run.head_branch.as_deref().unwrap_or("-");

    let mut blocks = vec![
        Block::Section {
            text: Some(Text::mrkdwn(format!(
                "A new build finished in *{}*:",
                ctx.run.repository
            ))),
            fields: None,
            accessory: None,
        },
        Block::Section {
            text: None,
            fields: Some(vec![
                Text::mrkdwn(format!("*Ref*\n{branch}")),
                Text::mrkdwn(format!("*Event*\n{}", run.event)),
            ]),
            accessory: None,
        },
        Block::Divider,
    ];
    blocks.extend(completed_jobs(jobs).map(job_block));
    blocks.push(Block::Divider);
    blocks.push(Block::Actions {
        elements: vec![
            Button::link(
                Text::plain("View Commit"),
                ctx.commit_url(&run.head_commit.id),
            ),
            Button::link(Text::plain("View CI/CD"), run.html_url.clone()),
        ],
    });

    Message {
        username: format!("[GitHub] {login}"),
        icon_url: ctx.avatar_url(login),
        blocks,
    }
}
