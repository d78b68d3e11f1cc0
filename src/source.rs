use async_trait::async_trait;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::JobsEnvelope;
use crate::sheets::SheetsSource;

/// Where the dashboard gets its listings from.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Human-readable location used in error messages.
    fn location(&self) -> String;

    async fn is_available(&self) -> bool;

    async fn fetch(&self, force_refresh: bool) -> Result<JobsEnvelope>;
}

#[async_trait]
impl JobSource for ApiClient {
    fn location(&self) -> String {
        self.base_url().to_string()
    }

    async fn is_available(&self) -> bool {
        self.is_backend_available().await
    }

    async fn fetch(&self, force_refresh: bool) -> Result<JobsEnvelope> {
        if force_refresh {
            self.refresh_jobs().await
        } else {
            self.get_jobs().await
        }
    }
}

#[async_trait]
impl JobSource for SheetsSource {
    fn location(&self) -> String {
        "Google Sheets".to_string()
    }

    async fn is_available(&self) -> bool {
        true
    }

    // There is no cache in front of the sheet, so every fetch is fresh.
    async fn fetch(&self, _force_refresh: bool) -> Result<JobsEnvelope> {
        let jobs = self.fetch_jobs().await?;
        let mut envelope = JobsEnvelope::from_jobs(jobs);
        envelope.cached = Some(false);
        Ok(envelope)
    }
}
