use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tokio::task::JoinHandle;

/// How often the hosted instance is pinged so the platform does not idle it.
pub const PING_INTERVAL: Duration = Duration::from_secs(14 * 60);

/// Send one GET to `url`, logging the outcome. Returns the status on a response.
pub async fn ping(client: &reqwest::Client, url: &str) -> Option<StatusCode> {
    match client.get(url).send().await {
        Ok(resp) if resp.status() == StatusCode::OK => {
            tracing::info!(%url, "keep-alive request sent successfully");
            Some(resp.status())
        }
        Ok(resp) => {
            tracing::warn!(%url, status = %resp.status(), "keep-alive request failed");
            Some(resp.status())
        }
        Err(err) => {
            tracing::error!(%url, "error while sending keep-alive request: {err}");
            None
        }
    }
}

/// Spawn the background job that pings `url` every `interval`.
///
/// The first ping happens one full interval after start.
pub fn spawn(url: String, interval: Duration) -> Result<JoinHandle<()>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build keep-alive HTTP client")?;

    Ok(tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        loop {
            ticker.tick().await;
            ping(&client, &url).await;
        }
    }))
}
