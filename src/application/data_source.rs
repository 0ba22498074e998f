// Remote data source trait for device-mode form pre-fill
use crate::domain::error::DashboardResult;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch a JSON document. Unreachable hosts, non-OK responses and
    /// non-JSON bodies all surface as `DashboardError::FetchFailure`.
    async fn fetch_json(&self, url: &str) -> DashboardResult<Value>;
}
