use anyhow::{Context, Result};

use crate::message::Message;

/// Deliver the message to a Slack incoming webhook. Not retried.
pub async fn post_slack(webhook_url: &str, message: &Message) -> Result<()> {
    reqwest::Client::new()
        .post(webhook_url)
        .json(message)
        .send()
        .await
        .map_err(reqwest::Error::without_url)
        .with_context(|| "Sending Slack webhook")?
        .error_for_status()
        .map_err(reqwest::Error::without_url)
        .with_context(|| "Slack API error")?;
    Ok(())
}
