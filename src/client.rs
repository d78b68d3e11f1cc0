use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::config::Settings;
use crate::error::{DashboardError, Result};
use crate::models::{routes, JobsEnvelope};
use crate::retry::{with_retry, RetryPolicy};

/// Client for the backend job API. Every call goes through [`with_retry`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::sheets::USER_AGENT)
            .build()?;
        let mut client = Self {
            http,
            base_url: String::new(),
            timeout,
            retry,
        };
        client.set_base_url(base_url)?;
        Ok(client)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.api.base_url, settings.api.timeout, settings.retry)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: &str) -> Result<()> {
        if !base_url.starts_with("http") {
            return Err(DashboardError::Config(
                "API URL must start with http:// or https://".to_string(),
            ));
        }
        self.base_url = base_url.trim_end_matches('/').to_string();
        tracing::debug!(base_url = %self.base_url, "API base URL set");
        Ok(())
    }

    pub async fn get_jobs(&self) -> Result<JobsEnvelope> {
        let envelope: JobsEnvelope = self.request(Method::GET, routes::JOBS_LIST).await?;
        Self::ensure_success(envelope)
    }

    /// Asks the backend to bypass its cache.
    pub async fn refresh_jobs(&self) -> Result<JobsEnvelope> {
        let envelope: JobsEnvelope = self.request(Method::POST, routes::JOBS_REFRESH).await?;
        Self::ensure_success(envelope)
    }

    pub async fn health_check(&self) -> Result<serde_json::Value> {
        self.request(Method::GET, routes::HEALTH).await
    }

    pub async fn is_backend_available(&self) -> bool {
        match self.health_check().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(base_url = %self.base_url, error = %e, "Backend unavailable");
                false
            }
        }
    }

    fn ensure_success(envelope: JobsEnvelope) -> Result<JobsEnvelope> {
        if envelope.success {
            Ok(envelope)
        } else {
            Err(DashboardError::InvalidResponse)
        }
    }

    async fn request<T: DeserializeOwned>(&self, method: Method, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        with_retry(&self.retry, self.timeout, endpoint, || {
            let request = self
                .http
                .request(method.clone(), &url)
                .header(CONTENT_TYPE, "application/json")
                .header(ACCEPT, "application/json");

            async move {
                let response = request.send().await?;
                let status = response.status();

                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(DashboardError::Status {
                        status: status.as_u16(),
                        body,
                        endpoint: endpoint.to_string(),
                    });
                }

                response
                    .json::<T>()
                    .await
                    .map_err(|e| DashboardError::Decode(e.to_string()))
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base_url() {
        let err = ApiClient::new("localhost:3001", Duration::from_secs(1), RetryPolicy::default())
            .unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }

    #[test]
    fn trims_trailing_slash() {
        let mut client =
            ApiClient::new("http://localhost:3001/", Duration::from_secs(1), RetryPolicy::default())
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001");

        client.set_base_url("https://jobs.example.com").unwrap();
        assert_eq!(client.base_url(), "https://jobs.example.com");
    }

    #[test]
    fn unsuccessful_envelope_is_invalid() {
        let envelope: JobsEnvelope =
            serde_json::from_str(r#"{"success": false, "data": []}"#).unwrap();
        assert!(matches!(
            ApiClient::ensure_success(envelope),
            Err(DashboardError::InvalidResponse)
        ));
    }
}
