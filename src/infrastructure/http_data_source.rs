// HTTP data source - fetches device JSON documents with reqwest
use crate::application::data_source::DataSource;
use crate::domain::error::{DashboardError, DashboardResult};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: reqwest::Client,
}

impl HttpDataSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_json(&self, url: &str) -> DashboardResult<Value> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DashboardError::FetchFailure(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(DashboardError::FetchFailure(format!(
                "{} answered with status {}",
                url,
                response.status()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DashboardError::FetchFailure(format!("{} did not return JSON: {}", url, e)))
    }
}
