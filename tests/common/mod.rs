#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use jobs_dashboard::retry::RetryPolicy;
use jobs_dashboard::sheets::SheetsSource;

pub const SHEET_CSV: &str = "Company,Job Title,Link\n\
    Acme Corp,backend engineer,https://acme.io/jobs/1\n\
    \"Globex, Inc.\",Rust Developer,\n\
    Initech,Platform ENGINEER,https://initech.com/careers\n";

pub const LOGIN_PAGE: &str = "<html><head><title>Sign in - Google Accounts</title></head>\
    <body><a href=\"https://accounts.google.com/ServiceLogin\">Sign in</a></body></html>";

/// Ordered record of which fake upstream routes were hit.
#[derive(Clone, Default)]
pub struct HitLog(Arc<Mutex<Vec<String>>>);

impl HitLog {
    pub fn record(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    pub fn hits(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|h| *h == name).count()
    }
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_upstream(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        delay: Duration::from_millis(5),
        backoff: 2,
    }
}

pub fn sheets_source(base: &str, paths: &[&str]) -> SheetsSource {
    let candidates = paths.iter().map(|p| format!("{}{}", base, p)).collect();
    SheetsSource::new(reqwest::Client::new(), candidates)
}
