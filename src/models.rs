use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_POSITION: &str = "Unknown Position";
pub const LINK_PLACEHOLDER: &str = "#";

/// Backend paths shared by the server and the API client.
pub mod routes {
    pub const JOBS_LIST: &str = "/api/v1/jobs/list";
    pub const JOBS_REFRESH: &str = "/api/v1/jobs/refresh";
    pub const HEALTH: &str = "/api/v1/health";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub company: String,
    pub job_title: String,
    pub link: String,
}

impl Job {
    pub fn new(
        company: impl Into<String>,
        job_title: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            job_title: job_title.into(),
            link: link.into(),
        }
    }

    /// The application link, unless it is the placeholder.
    pub fn application_link(&self) -> Option<&str> {
        let link = self.link.trim();
        if link.is_empty() || link == LINK_PLACEHOLDER {
            None
        } else {
            Some(link)
        }
    }
}

/// JSON envelope returned by the backend job endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_duration: Option<u64>,
}

pub type JobsEnvelope = ApiResponse<Vec<Job>>;

impl JobsEnvelope {
    pub fn from_jobs(jobs: Vec<Job>) -> Self {
        Self {
            success: true,
            count: Some(jobs.len()),
            data: jobs,
            last_updated: Some(Utc::now()),
            cached: None,
            message: None,
            cache_duration: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub version: String,
    pub configuration: SheetStatus,
    pub endpoints: EndpointMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetStatus {
    pub sheet_configured: bool,
    pub sheet_id: Option<String>,
    pub sheet_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointMap {
    pub jobs_list: String,
    pub jobs_refresh: String,
    pub health: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_link_is_not_an_application_link() {
        assert_eq!(Job::new("Acme", "Dev", "#").application_link(), None);
        assert_eq!(Job::new("Acme", "Dev", " ").application_link(), None);
        assert_eq!(
            Job::new("Acme", "Dev", "https://acme.io/jobs/1").application_link(),
            Some("https://acme.io/jobs/1")
        );
    }

    #[test]
    fn envelope_accepts_minimal_payload() {
        let raw = r##"{"success": true, "data": [{"company": "Acme", "job_title": "Dev", "link": "#"}]}"##;
        let envelope: JobsEnvelope = serde_json::from_str(raw).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.cached, None);
    }

    #[test]
    fn envelope_omits_absent_fields() {
        let mut envelope = JobsEnvelope::from_jobs(vec![]);
        envelope.last_updated = None;
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["count"], 0);
        assert!(json.get("message").is_none());
        assert!(json.get("last_updated").is_none());
    }
}
