use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use mealbook_core::service::MealSource;

/// HTTP client for the remote meal collection.
pub struct MealApiClient {
    client: reqwest::Client,
    url: String,
}

impl MealApiClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "mealbook/{} (recipe browser)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MealSource for MealApiClient {
    async fn fetch_all(&self) -> Result<Value> {
        tracing::info!(url = %self.url, "requesting meal collection");
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to reach meal API")?
            .error_for_status()
            .context("Meal API returned an error status")?;

        resp.json()
            .await
            .context("Failed to parse meal API response")
    }
}
