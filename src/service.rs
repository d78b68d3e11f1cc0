use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{Job, JobsEnvelope};
use crate::sheets::SheetsSource;
use crate::source::JobSource;

#[derive(Debug, Clone)]
struct CacheEntry {
    jobs: Vec<Job>,
    fetched_at: Instant,
    last_updated: DateTime<Utc>,
}

/// Backend side of the job API: a TTL cache in front of the sheet.
#[derive(Debug)]
pub struct JobService {
    sheets: SheetsSource,
    cache: RwLock<Option<CacheEntry>>,
    ttl: Duration,
}

impl JobService {
    pub fn new(sheets: SheetsSource, ttl: Duration) -> Self {
        Self {
            sheets,
            cache: RwLock::new(None),
            ttl,
        }
    }

    pub async fn is_cache_valid(&self) -> bool {
        self.cache
            .read()
            .await
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.ttl)
    }

    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.cache.read().await.as_ref().map(|entry| entry.last_updated)
    }

    /// Cached listings while fresh, otherwise a new fetch from the sheet.
    /// A failed fetch leaves the previous cache in place.
    pub async fn list(&self, force_refresh: bool) -> Result<JobsEnvelope> {
        if !force_refresh {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.as_ref().filter(|e| e.fetched_at.elapsed() < self.ttl) {
                tracing::info!(count = entry.jobs.len(), "Returning cached job data");
                return Ok(self.envelope(entry.jobs.clone(), entry.last_updated, true));
            }
        }

        let jobs = self.sheets.fetch_jobs().await?;
        let last_updated = Utc::now();

        *self.cache.write().await = Some(CacheEntry {
            jobs: jobs.clone(),
            fetched_at: Instant::now(),
            last_updated,
        });

        tracing::info!(count = jobs.len(), force_refresh, "Job cache updated");
        Ok(self.envelope(jobs, last_updated, false))
    }

    fn envelope(&self, jobs: Vec<Job>, last_updated: DateTime<Utc>, cached: bool) -> JobsEnvelope {
        JobsEnvelope {
            success: true,
            count: Some(jobs.len()),
            data: jobs,
            last_updated: Some(last_updated),
            cached: Some(cached),
            message: None,
            cache_duration: Some(self.ttl.as_secs()),
        }
    }
}

#[async_trait]
impl JobSource for JobService {
    fn location(&self) -> String {
        "Google Sheets".to_string()
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn fetch(&self, force_refresh: bool) -> Result<JobsEnvelope> {
        self.list(force_refresh).await
    }
}
