use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use jobs_dashboard::client::ApiClient;
use jobs_dashboard::config::{ApiEnvironment, Settings};
use jobs_dashboard::server::{self, ApiState, DashboardState};
use jobs_dashboard::service::JobService;
use jobs_dashboard::sheets::SheetsSource;
use jobs_dashboard::source::JobSource;
use jobs_dashboard::view::{filter_jobs, render_cards};

#[derive(Parser, Debug)]
#[command(name = "jobs-dashboard")]
#[command(version)]
#[command(about = "Job listings dashboard backed by a published spreadsheet")]
struct Args {
    /// Backend environment (development, production, staging)
    #[arg(long, global = true, value_parser = parse_environment)]
    environment: Option<ApiEnvironment>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the job API and the dashboard in one process
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Run only the dashboard, reading from a remote backend or the sheet
    Dashboard {
        #[arg(long)]
        host: Option<String>,

        #[arg(long, default_value = "8080")]
        port: u16,

        #[arg(long, value_enum, default_value = "api")]
        source: SourceKind,

        /// Backend base URL, overrides the environment default
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Print job cards to the terminal
    List {
        #[arg(long, value_enum, default_value = "api")]
        source: SourceKind,

        #[arg(long)]
        api_url: Option<String>,

        /// Case-insensitive filter on title or company
        #[arg(long, short = 's', default_value = "")]
        search: String,

        /// Bypass the backend cache
        #[arg(long)]
        refresh: bool,

        #[arg(long, short = 'o', value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Check whether the backend is reachable
    Health {
        #[arg(long)]
        api_url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceKind {
    Api,
    Sheets,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn parse_environment(raw: &str) -> Result<ApiEnvironment, String> {
    ApiEnvironment::parse(raw).ok_or_else(|| format!("Unknown environment: {}", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = Settings::load_dotenv(None);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let args = Args::parse();

    let mut settings = Settings::from_env().context("failed to load configuration")?;
    if let Some(environment) = args.environment {
        settings = settings.switch_environment(environment);
    }
    if let Some(url) = api_url_override(&args.command) {
        settings = settings.with_api_base_url(url)?;
    }

    let errors = settings.validate();
    if !errors.is_empty() {
        bail!("Configuration errors: {}", errors.join(", "));
    }
    settings.log_summary();

    match args.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.host.clone());
            let addr = resolve(&host, port.unwrap_or(settings.port)).await?;
            let sheets = SheetsSource::from_settings(&settings)?;
            let service = Arc::new(JobService::new(sheets, settings.cache_ttl));

            let dashboard = DashboardState::new(settings.app_title.clone(), service.clone())
                .with_static_dir(settings.static_dir.clone());
            let api = ApiState {
                service,
                settings: Arc::new(settings),
            };
            server::run(addr, server::app(Some(api), dashboard)).await?;
        }
        Commands::Dashboard {
            host, port, source, ..
        } => {
            let host = host.unwrap_or_else(|| settings.host.clone());
            let addr = resolve(&host, port).await?;
            let source = build_source(source, &settings)?;
            let dashboard = DashboardState::new(settings.app_title.clone(), source)
                .with_static_dir(settings.static_dir.clone());
            server::run(addr, server::app(None, dashboard)).await?;
        }
        Commands::List {
            source,
            search,
            refresh,
            output,
            ..
        } => {
            let source = build_source(source, &settings)?;
            let envelope = source
                .fetch(refresh)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message(&source.location())))?;
            let jobs = filter_jobs(&envelope.data, &search);

            match output {
                OutputFormat::Table => {
                    println!("{} jobs found\n", jobs.len());
                    print!("{}", render_cards(&jobs));
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&jobs)?),
            }
        }
        Commands::Health { .. } => {
            let client = ApiClient::from_settings(&settings)?;
            let report = client
                .health_check()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message(client.base_url())))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobs_dashboard=info,tower_http=info"))
}

fn api_url_override(command: &Commands) -> Option<&str> {
    match command {
        Commands::Dashboard { api_url, .. }
        | Commands::List { api_url, .. }
        | Commands::Health { api_url } => api_url.as_deref(),
        Commands::Serve { .. } => None,
    }
}

fn build_source(kind: SourceKind, settings: &Settings) -> anyhow::Result<Arc<dyn JobSource>> {
    let source: Arc<dyn JobSource> = match kind {
        SourceKind::Api => Arc::new(ApiClient::from_settings(settings)?),
        SourceKind::Sheets => Arc::new(SheetsSource::from_settings(settings)?),
    };
    Ok(source)
}

async fn resolve(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("failed to resolve {}:{}", host, port))?
        .next()
        .with_context(|| format!("no address for {}:{}", host, port))
}
