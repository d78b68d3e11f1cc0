use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DashboardError, Result};
use crate::retry::RetryPolicy;

pub const DEFAULT_SHEET_ID: &str = "1cXb9E8SRLSZtvHrQfuuY6RPuAfaH0AQBmMsGK7rZxn4";
pub const DEFAULT_SHEET_NAME: &str = "sheet_1";
pub const DEFAULT_TITLE: &str = "Job Dashboard - Software Engineering Positions";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Which backend deployment the dashboard talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEnvironment {
    Development,
    Production,
    Staging,
}

impl ApiEnvironment {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(ApiEnvironment::Development),
            "production" | "prod" => Some(ApiEnvironment::Production),
            "staging" => Some(ApiEnvironment::Staging),
            _ => None,
        }
    }

    fn api_settings<F>(self, lookup: &F) -> ApiSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            ApiEnvironment::Development => ApiSettings {
                base_url: "http://localhost:3001".to_string(),
                timeout: Duration::from_millis(10_000),
            },
            ApiEnvironment::Production => ApiSettings {
                base_url: lookup("API_BASE_URL")
                    .unwrap_or_else(|| "https://your-backend-on-render.com".to_string()),
                timeout: Duration::from_millis(15_000),
            },
            ApiEnvironment::Staging => ApiSettings {
                base_url: lookup("STAGING_API_URL")
                    .unwrap_or_else(|| "https://staging-backend.com".to_string()),
                timeout: Duration::from_millis(12_000),
            },
        }
    }
}

impl fmt::Display for ApiEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiEnvironment::Development => "development",
            ApiEnvironment::Production => "production",
            ApiEnvironment::Staging => "staging",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub app_title: String,
    pub host: String,
    pub port: u16,
    pub sheet_id: String,
    pub sheet_name: String,
    pub google_api_key: Option<String>,
    pub environment: ApiEnvironment,
    pub api: ApiSettings,
    pub retry: RetryPolicy,
    pub cache_ttl: Duration,
    /// Directory served under `/static`, resolved against the working directory.
    pub static_dir: PathBuf,
}

impl Settings {
    /// Copies `path`, or the nearest `.env` when `None`, into the process
    /// environment. Variables that are already set are left alone.
    pub fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(path) => dotenvy::from_path(path).ok().map(|_| path.to_path_buf()),
            None => dotenvy::dotenv().ok(),
        }
    }

    /// Reads the process environment. Call [`Settings::load_dotenv`] first
    /// to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings from a dotenv-style file. Values in the file win over
    /// the process environment.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        let iter = dotenvy::from_path_iter(path)
            .map_err(|e| DashboardError::Config(format!("{}: {}", path.display(), e)))?;
        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) =
                item.map_err(|e| DashboardError::Config(format!("{}: {}", path.display(), e)))?;
            vars.insert(key, value);
        }
        Self::from_lookup(|key| vars.get(key).cloned().or_else(|| std::env::var(key).ok()))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("API_ENVIRONMENT") {
            Some(raw) => ApiEnvironment::parse(&raw).ok_or_else(|| {
                DashboardError::Config(format!("Unknown environment: {}", raw))
            })?,
            None if cfg!(debug_assertions) => ApiEnvironment::Development,
            None => ApiEnvironment::Production,
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| DashboardError::Config(format!("PORT is not a valid port: {}", raw)))?,
            None => 3001,
        };

        let cache_ttl = match get("CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                DashboardError::Config(format!("CACHE_TTL_SECS is not a number: {}", raw))
            })?),
            None => Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        };

        Ok(Settings {
            app_title: get("APP_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            sheet_id: get("GOOGLE_SHEET_ID").unwrap_or_else(|| DEFAULT_SHEET_ID.to_string()),
            sheet_name: get("GOOGLE_SHEET_NAME").unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            google_api_key: get("GOOGLE_API_KEY"),
            environment,
            api: environment.api_settings(&get),
            retry: RetryPolicy::default(),
            cache_ttl,
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        })
    }

    /// Points the API client somewhere else, e.g. from `--api-url`.
    pub fn with_api_base_url(mut self, base_url: &str) -> Result<Self> {
        if !base_url.starts_with("http") {
            return Err(DashboardError::Config(
                "API URL must start with http:// or https://".to_string(),
            ));
        }
        self.api.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn switch_environment(mut self, environment: ApiEnvironment) -> Self {
        self.environment = environment;
        self.api = environment.api_settings(&|key: &str| std::env::var(key).ok());
        self
    }

    /// All problems with the current settings, empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.api.base_url.is_empty() {
            errors.push("API base URL is not configured".to_string());
        }
        if !self.api.base_url.starts_with("http") {
            errors.push("API base URL must start with http:// or https://".to_string());
        }
        if self.api.timeout < Duration::from_millis(1000) {
            errors.push("API timeout must be at least 1000ms".to_string());
        }
        if self.app_title.trim().is_empty() {
            errors.push("App title is required".to_string());
        }
        if self.sheet_id.trim().is_empty() {
            errors.push("GOOGLE_SHEET_ID is required".to_string());
        }
        if self.sheet_name.trim().is_empty() {
            errors.push("GOOGLE_SHEET_NAME is required".to_string());
        }
        if self.cache_ttl < Duration::from_secs(1) {
            errors.push("CACHE_TTL_SECS must be at least 1".to_string());
        }
        if self.retry.attempts == 0 {
            errors.push("Retry attempts must be at least 1".to_string());
        }

        errors
    }

    pub fn log_summary(&self) {
        tracing::info!(
            title = %self.app_title,
            environment = %self.environment,
            api_base_url = %self.api.base_url,
            api_timeout_ms = self.api.timeout.as_millis() as u64,
            sheet_name = %self.sheet_name,
            sheets_api = self.google_api_key.is_some(),
            cache_ttl_secs = self.cache_ttl.as_secs(),
            static_dir = %self.static_dir.display(),
            "Configuration loaded"
        );
    }
}
