use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header::CACHE_CONTROL, HeaderValue},
    response::{Html, Redirect},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::{Settings, DEFAULT_STATIC_DIR};
use crate::error::Result;
use crate::models::{routes, EndpointMap, HealthReport, JobsEnvelope, SheetStatus};
use crate::service::JobService;
use crate::source::JobSource;
use crate::view::{BackendStatus, JobBoard, JobCard, LoadOutcome};

const SERVICE_NAME: &str = "Job Dashboard Backend API";
const REFRESH_MESSAGE: &str = "Job data refreshed successfully from Google Sheets";

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<JobService>,
    pub settings: Arc<Settings>,
}

#[derive(Clone)]
pub struct DashboardState {
    pub title: String,
    pub source: Arc<dyn JobSource>,
    pub board: Arc<RwLock<JobBoard>>,
    pub static_dir: PathBuf,
}

impl DashboardState {
    pub fn new(title: impl Into<String>, source: Arc<dyn JobSource>) -> Self {
        Self {
            title: title.into(),
            source,
            board: Arc::new(RwLock::new(JobBoard::new())),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub title: String,
    pub search: String,
    pub cards: Vec<JobCard>,
    pub last_updated: Option<String>,
    pub backend_label: Option<&'static str>,
    pub backend_class: &'static str,
    pub error: Option<String>,
    pub show_backend_help: bool,
    pub refresh_enabled: bool,
}

impl DashboardTemplate {
    pub fn from_board(title: &str, board: &JobBoard, search: &str) -> Self {
        let cards = board.filtered(search).iter().map(JobCard::from).collect();
        let (backend_label, backend_class) = match board.backend() {
            BackendStatus::Online => (Some("Online"), "online"),
            BackendStatus::Offline => (Some("Offline"), "offline"),
            BackendStatus::Unknown => (None, ""),
        };

        Self {
            title: title.to_string(),
            search: search.to_string(),
            cards,
            last_updated: board
                .last_updated()
                .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string()),
            backend_label,
            backend_class,
            error: board.error().map(str::to_string),
            show_backend_help: board.backend() == BackendStatus::Offline,
            refresh_enabled: board.backend() == BackendStatus::Online,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route(routes::JOBS_LIST, get(list_jobs_handler))
        .route(routes::JOBS_REFRESH, post(refresh_jobs_handler))
        .route(routes::HEALTH, get(health_handler))
        .with_state(state)
}

pub fn dashboard_router(state: DashboardState) -> Router {
    let assets = ServeDir::new(&state.static_dir);
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/refresh", post(refresh_handler))
        .route("/retry", post(retry_handler))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
        .nest_service("/static", assets)
}

/// Full application: the JSON API when this process owns the cache, plus
/// the HTML dashboard.
pub fn app(api: Option<ApiState>, dashboard: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = dashboard_router(dashboard);
    if let Some(api) = api {
        router = router.merge(api_router(api));
    }
    router.layer(cors).layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Job dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Job dashboard shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

pub fn health_report(settings: &Settings) -> HealthReport {
    let sheet_id = settings.sheet_id.trim();
    HealthReport {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        configuration: SheetStatus {
            sheet_configured: !sheet_id.is_empty(),
            sheet_id: (!sheet_id.is_empty())
                .then(|| format!("{}...", sheet_id.chars().take(10).collect::<String>())),
            sheet_name: settings.sheet_name.clone(),
        },
        endpoints: EndpointMap {
            jobs_list: routes::JOBS_LIST.to_string(),
            jobs_refresh: routes::JOBS_REFRESH.to_string(),
            health: routes::HEALTH.to_string(),
        },
    }
}

async fn list_jobs_handler(State(state): State<ApiState>) -> Result<Json<JobsEnvelope>> {
    tracing::info!("Fetching job listings");
    let envelope = state.service.list(false).await?;
    Ok(Json(envelope))
}

async fn refresh_jobs_handler(State(state): State<ApiState>) -> Result<Json<JobsEnvelope>> {
    tracing::info!("Force refreshing job listings");
    let mut envelope = state.service.list(true).await?;
    envelope.message = Some(REFRESH_MESSAGE.to_string());
    Ok(Json(envelope))
}

async fn health_handler(State(state): State<ApiState>) -> Json<HealthReport> {
    tracing::debug!("Health check requested");
    Json(health_report(&state.settings))
}

async fn dashboard_handler(
    State(state): State<DashboardState>,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>> {
    let (loaded, backend) = {
        let board = state.board.read().await;
        (board.is_loaded(), board.backend())
    };
    if !loaded {
        let outcome = LoadOutcome::fetch(state.source.as_ref(), backend, false).await;
        let mut board = state.board.write().await;
        if !board.is_loaded() {
            board.apply(outcome);
        }
    }

    let board = state.board.read().await;
    let page = DashboardTemplate::from_board(&state.title, &board, &query.q).render()?;
    Ok(Html(page))
}

async fn refresh_handler(State(state): State<DashboardState>) -> Redirect {
    reload(&state, true).await;
    Redirect::to("/")
}

async fn retry_handler(State(state): State<DashboardState>) -> Redirect {
    reload(&state, false).await;
    Redirect::to("/")
}

/// The board lock is only taken to read the status and to store the result,
/// never across the fetch.
async fn reload(state: &DashboardState, force_refresh: bool) {
    let backend = state.board.read().await.backend();
    let outcome = LoadOutcome::fetch(state.source.as_ref(), backend, force_refresh).await;
    state.board.write().await.apply(outcome);
}
