use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::Job;
use crate::source::JobSource;

/// Jobs whose title or company contains `term`, ignoring case. A blank term
/// keeps everything; otherwise the term is matched as typed, spaces included.
pub fn filter_jobs(jobs: &[Job], term: &str) -> Vec<Job> {
    if term.trim().is_empty() {
        return jobs.to_vec();
    }
    let needle = term.to_lowercase();

    jobs.iter()
        .filter(|job| {
            job.job_title.to_lowercase().contains(&needle)
                || job.company.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

pub fn title_case(title: &str) -> String {
    title
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.as_str().to_lowercase().chars())
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn company_initials(company: &str) -> String {
    company
        .split(' ')
        .filter_map(|word| word.chars().next())
        .collect::<String>()
        .to_uppercase()
        .chars()
        .take(2)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCard {
    pub initials: String,
    pub title: String,
    pub company: String,
    pub link: Option<String>,
}

impl From<&Job> for JobCard {
    fn from(job: &Job) -> Self {
        Self {
            initials: company_initials(&job.company),
            title: title_case(&job.job_title),
            company: job.company.clone(),
            link: job.application_link().map(str::to_string),
        }
    }
}

/// Plain-text cards for the terminal.
pub fn render_cards(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return "No jobs found\nTry adjusting your search terms or refresh the data.\n".to_string();
    }

    let mut out = String::new();
    for job in jobs {
        let card = JobCard::from(job);
        let _ = writeln!(out, "[{:<2}] {}", card.initials, card.title);
        let _ = writeln!(out, "     {}", card.company);
        if let Some(link) = &card.link {
            let _ = writeln!(out, "     {}", link);
        }
        out.push('\n');
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Unknown,
    Online,
    Offline,
}

/// State behind the dashboard screen.
#[derive(Debug, Clone)]
pub struct JobBoard {
    jobs: Vec<Job>,
    last_updated: Option<DateTime<Utc>>,
    error: Option<String>,
    backend: BackendStatus,
    loaded: bool,
}

impl Default for JobBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl JobBoard {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            last_updated: None,
            error: None,
            backend: BackendStatus::Unknown,
            loaded: false,
        }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn backend(&self) -> BackendStatus {
        self.backend
    }

    /// Whether a load has been attempted yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn filtered(&self, term: &str) -> Vec<Job> {
        filter_jobs(&self.jobs, term)
    }

    /// Record the result of a fetch.
    pub fn apply(&mut self, outcome: LoadOutcome) {
        self.loaded = true;
        self.error = None;

        match outcome {
            LoadOutcome::Loaded(jobs) => {
                self.jobs = jobs;
                self.last_updated = Some(Utc::now());
                self.backend = BackendStatus::Online;
            }
            LoadOutcome::Unavailable(message) | LoadOutcome::Failed(message) => {
                self.backend = BackendStatus::Offline;
                self.error = Some(message);
            }
        }
    }

    /// Fetch listings into the board. Listings from an earlier successful
    /// load are kept when this one fails.
    pub async fn load(&mut self, source: &dyn JobSource, force_refresh: bool) {
        let outcome = LoadOutcome::fetch(source, self.backend, force_refresh).await;
        self.apply(outcome);
    }
}

/// What one trip to a [`JobSource`] produced, ready to apply to a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(Vec<Job>),
    Unavailable(String),
    Failed(String),
}

impl LoadOutcome {
    /// Availability is probed first unless the backend is already online.
    pub async fn fetch(source: &dyn JobSource, backend: BackendStatus, force_refresh: bool) -> Self {
        if backend != BackendStatus::Online && !source.is_available().await {
            return LoadOutcome::Unavailable(format!(
                "Backend server is not available at {}. Please start the backend server.",
                source.location()
            ));
        }

        tracing::info!(force_refresh, source = %source.location(), "Fetching jobs");
        match source.fetch(force_refresh).await {
            Ok(envelope) => {
                tracing::info!(
                    count = envelope.data.len(),
                    cached = envelope.cached.unwrap_or(false),
                    "Loaded jobs"
                );
                LoadOutcome::Loaded(envelope.data)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch jobs");
                LoadOutcome::Failed(e.user_message(&source.location()))
            }
        }
    }
}
