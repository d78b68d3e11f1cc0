use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
        endpoint: String,
    },

    #[error("Request timeout after {timeout_ms}ms for {endpoint}")]
    Timeout { timeout_ms: u128, endpoint: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response from API")]
    InvalidResponse,

    #[error("Unable to fetch job data from Google Sheets. Please check sheet configuration and accessibility.")]
    SourcesExhausted,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    /// Client errors (4xx) are final; everything else is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DashboardError::Status { status, .. } if (400..500).contains(status))
    }

    pub fn is_connectivity(&self) -> bool {
        match self {
            DashboardError::Timeout { .. } => true,
            DashboardError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    /// Single message shown to the dashboard user.
    pub fn user_message(&self, base_url: &str) -> String {
        if self.is_connectivity() {
            format!(
                "Cannot connect to backend server. Please ensure the backend is running on {}",
                base_url
            )
        } else {
            self.to_string()
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::SourcesExhausted => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(status = %status, error = %self, "Request failed");
        (
            status,
            Json(json!({ "success": false, "detail": self.to_string() })),
        )
            .into_response()
    }
}
