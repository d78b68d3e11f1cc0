mod common;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::json;

use common::{sheets_source, spawn_upstream, HitLog, LOGIN_PAGE, SHEET_CSV};
use jobs_dashboard::{DashboardError, Job};

fn upstream(log: HitLog) -> Router {
    Router::new()
        .route(
            "/missing",
            get(|State(log): State<HitLog>| async move {
                log.record("missing");
                (StatusCode::NOT_FOUND, "not found")
            }),
        )
        .route(
            "/login",
            get(|State(log): State<HitLog>| async move {
                log.record("login");
                LOGIN_PAGE
            }),
        )
        .route(
            "/empty",
            get(|State(log): State<HitLog>| async move {
                log.record("empty");
                "Company,Job Title,Link\n"
            }),
        )
        .route(
            "/good",
            get(|State(log): State<HitLog>| async move {
                log.record("good");
                SHEET_CSV
            }),
        )
        .route(
            "/values",
            get(|State(log): State<HitLog>| async move {
                log.record("values");
                Json(json!({
                    "range": "sheet_1!A1:C3",
                    "values": [
                        ["Company", "Job Title", "Link"],
                        ["Umbrella", "Researcher", "https://umbrella.com"],
                        ["", "No Company", "https://x.io"]
                    ]
                }))
            }),
        )
        .route(
            "/values-denied",
            get(|State(log): State<HitLog>| async move {
                log.record("values-denied");
                (StatusCode::FORBIDDEN, "API key not valid")
            }),
        )
        .with_state(log)
}

#[tokio::test]
async fn skips_failing_candidates_until_one_yields_jobs() {
    let log = HitLog::default();
    let base = spawn_upstream(upstream(log.clone())).await;
    let source = sheets_source(&base, &["/missing", "/login", "/empty", "/good", "/missing"]);

    let jobs = source.fetch_jobs().await.unwrap();

    assert_eq!(jobs.len(), 3);
    assert_eq!(
        jobs[0],
        Job::new("Acme Corp", "backend engineer", "https://acme.io/jobs/1")
    );
    assert_eq!(jobs[1].company, "Globex, Inc.");
    assert_eq!(jobs[1].link, "#");
    assert_eq!(log.hits(), vec!["missing", "login", "empty", "good"]);
}

#[tokio::test]
async fn first_working_candidate_wins() {
    let log = HitLog::default();
    let base = spawn_upstream(upstream(log.clone())).await;
    let source = sheets_source(&base, &["/good", "/missing"]);

    source.fetch_jobs().await.unwrap();

    assert_eq!(log.hits(), vec!["good"]);
}

#[tokio::test]
async fn reports_single_failure_when_every_candidate_fails() {
    let log = HitLog::default();
    let base = spawn_upstream(upstream(log.clone())).await;
    let source = sheets_source(&base, &["/missing", "/login", "/empty"]);

    let err = source.fetch_jobs().await.unwrap_err();

    assert!(matches!(err, DashboardError::SourcesExhausted));
    assert_eq!(log.hits().len(), 3);
}

#[tokio::test]
async fn unreachable_candidate_is_skipped() {
    let log = HitLog::default();
    let base = spawn_upstream(upstream(log.clone())).await;
    let dead = common::closed_port_url().await;

    let source = jobs_dashboard::sheets::SheetsSource::new(
        reqwest::Client::new(),
        vec![format!("{}/good", dead), format!("{}/good", base)],
    );

    let jobs = source.fetch_jobs().await.unwrap();
    assert_eq!(jobs.len(), 3);
    assert_eq!(log.count("good"), 1);
}

#[tokio::test]
async fn values_api_is_tried_first() {
    let log = HitLog::default();
    let base = spawn_upstream(upstream(log.clone())).await;
    let source = sheets_source(&base, &["/good"]).with_values_api(format!("{}/values", base));

    let jobs = source.fetch_jobs().await.unwrap();

    assert_eq!(
        jobs,
        vec![Job::new("Umbrella", "Researcher", "https://umbrella.com")]
    );
    assert_eq!(log.hits(), vec!["values"]);
}

#[tokio::test]
async fn rejected_values_api_falls_back_to_csv() {
    let log = HitLog::default();
    let base = spawn_upstream(upstream(log.clone())).await;
    let source =
        sheets_source(&base, &["/good"]).with_values_api(format!("{}/values-denied", base));

    let jobs = source.fetch_jobs().await.unwrap();

    assert_eq!(jobs.len(), 3);
    assert_eq!(log.hits(), vec!["values-denied", "good"]);
}
