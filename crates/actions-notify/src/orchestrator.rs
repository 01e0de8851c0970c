use anyhow::Result;

use crate::config::Settings;
use crate::context::RunContext;
use crate::github::{source_from_config, Conclusion};
use crate::message::{
    build_message, completed_jobs, conclusion_label, reported_failed_step, Message,
    MessageContext,
};
use crate::sink::post_slack;

#[derive(Debug, serde::Serialize)]
pub struct JobResult {
    pub job: String,
    pub conclusion: String,
    pub failed_step: Option<String>,
    pub passed: bool,
}

#[derive(Debug)]
pub struct Report {
    pub message: Message,
    pub results: Vec<JobResult>,
    pub delivered: bool,
}

/// Fetch the run and its jobs, render the summary and deliver it.
/// Nothing is sent unless both fetches succeed.
pub async fn notify(settings: &Settings, ctx: &RunContext, dry_run: bool) -> Result<Report> {
    let webhook = if dry_run {
        None
    } else {
        Some(settings.webhook_url()?)
    };
    let source = source_from_config(&settings.source, settings.token.as_deref())?;

    tracing::info!(
        "Fetching run {} of {}/{}",
        ctx.run_id,
        ctx.owner,
        ctx.repository
    );
    let (jobs, run) = tokio::try_join!(source.fetch_jobs(ctx), source.fetch_run(ctx))?;
    tracing::debug!("Run has {} job(s)", jobs.len());

    let message_ctx = MessageContext {
        run: ctx,
        server_url: &settings.server_url,
    };
    let message = build_message(&message_ctx, &run, &jobs);

    let results = completed_jobs(&jobs)
        .map(|job| JobResult {
            job: job.name.clone(),
            conclusion: conclusion_label(job.conclusion.as_ref()),
            failed_step: reported_failed_step(job).map(|s| s.name.clone()),
            passed: job.conclusion == Some(Conclusion::Success),
        })
        .collect();

    let delivered = match webhook {
        Some(url) => {
            post_slack(url, &message).await?;
            tracing::info!("Notification delivered");
            true
        }
        None => {
            tracing::info!("Dry run, notification not sent");
            false
        }
    };

    Ok(Report {
        message,
        results,
        delivered,
    })
}
