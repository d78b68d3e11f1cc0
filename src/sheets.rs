//! Fetches job rows straight from a published Google Sheet.
//!
//! Several export URL formats are tried in order because which one works
//! depends on how the sheet was shared. A private sheet answers with a
//! sign-in page and a 200 status, so bodies are inspected before parsing.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::Deserialize;

use crate::config::Settings;
use crate::error::{DashboardError, Result};
use crate::models::Job;
use crate::parse::{job_from_columns, parse_jobs_csv};

pub const USER_AGENT: &str = "jobs-dashboard/1.0";
const CSV_ACCEPT: &str = "text/csv,text/plain,*/*";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SHEETS_BASE: &str = "https://docs.google.com/spreadsheets/d";
const VALUES_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Export URLs for a sheet, most specific first.
pub fn export_urls(sheet_id: &str, sheet_name: &str) -> Vec<String> {
    let base = format!("{}/{}", SHEETS_BASE, sheet_id);
    vec![
        format!("{}/export?format=csv&gid=0", base),
        format!("{}/export?format=csv", base),
        gviz_url(&base, Some(sheet_name)),
        gviz_url(&base, None),
    ]
}

fn gviz_url(base: &str, sheet_name: Option<&str>) -> String {
    let fallback = format!("{}/gviz/tq?tqx=out:csv", base);
    let Ok(mut url) = Url::parse(&format!("{}/gviz/tq", base)) else {
        return fallback;
    };
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("tqx", "out:csv");
        if let Some(name) = sheet_name {
            query.append_pair("sheet", name);
        }
    }
    url.to_string()
}

/// URL of the Sheets v4 values endpoint covering columns A to C.
pub fn values_api_url(sheet_id: &str, sheet_name: &str, api_key: &str) -> Result<String> {
    let mut url = Url::parse(VALUES_API_BASE)
        .map_err(|e| DashboardError::Config(format!("invalid Sheets API base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| DashboardError::Config("Sheets API base cannot hold a path".to_string()))?
        .push(sheet_id)
        .push("values")
        .push(&format!("{}!A:C", sheet_name));
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url.to_string())
}

pub fn looks_like_login_page(body: &str) -> bool {
    body.contains("accounts.google.com") || body.contains("Sign in")
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct SheetsSource {
    client: reqwest::Client,
    candidates: Vec<String>,
    values_api: Option<String>,
}

impl SheetsSource {
    pub fn new(client: reqwest::Client, candidates: Vec<String>) -> Self {
        Self {
            client,
            candidates,
            values_api: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut source = Self::new(
            client,
            export_urls(&settings.sheet_id, &settings.sheet_name),
        );
        if let Some(key) = &settings.google_api_key {
            source.values_api = Some(values_api_url(
                &settings.sheet_id,
                &settings.sheet_name,
                key,
            )?);
        }
        Ok(source)
    }

    /// Try the values API first when one is configured.
    pub fn with_values_api(mut self, url: impl Into<String>) -> Self {
        self.values_api = Some(url.into());
        self
    }

    /// Returns listings from the first source that yields any.
    pub async fn fetch_jobs(&self) -> Result<Vec<Job>> {
        if let Some(url) = &self.values_api {
            match self.fetch_values(url).await {
                Ok(jobs) if !jobs.is_empty() => {
                    tracing::info!(count = jobs.len(), "Fetched jobs from Sheets values API");
                    return Ok(jobs);
                }
                Ok(_) => tracing::warn!("Sheets values API returned no valid job data"),
                Err(e) => tracing::warn!(error = %e, "Sheets values API failed"),
            }
        }

        for (index, url) in self.candidates.iter().enumerate() {
            let candidate = index + 1;
            tracing::info!(candidate, url = %url, "Trying Google Sheets URL");

            match self.fetch_csv(url).await {
                Ok(jobs) => {
                    tracing::info!(candidate, count = jobs.len(), "Fetched jobs from Google Sheets");
                    return Ok(jobs);
                }
                Err(e) => tracing::warn!(candidate, error = %e, "Google Sheets URL failed"),
            }
        }

        Err(DashboardError::SourcesExhausted)
    }

    async fn fetch_csv(&self, url: &str) -> Result<Vec<Job>> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, CSV_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                status: status.as_u16(),
                body: String::new(),
                endpoint: url.to_string(),
            });
        }

        let text = response.text().await?;
        if looks_like_login_page(&text) {
            return Err(DashboardError::Decode(
                "returned login page, sheet is not public".to_string(),
            ));
        }

        let jobs = parse_jobs_csv(&text);
        if jobs.is_empty() {
            return Err(DashboardError::Decode("no valid job data".to_string()));
        }
        Ok(jobs)
    }

    async fn fetch_values(&self, url: &str) -> Result<Vec<Job>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
                endpoint: "sheets values API".to_string(),
            });
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| DashboardError::Decode(e.to_string()))?;

        Ok(range
            .values
            .iter()
            .skip(1)
            .filter_map(|row| job_from_columns(row.as_slice()))
            .collect())
    }
}
