//! Ocean Insight API server binary.
//!
//! Reads configuration from the environment (and `.env`), selects a store,
//! and serves the API until Ctrl-C or SIGTERM.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ocean_api::config::ApiConfig;
use ocean_api::mailer::TracingMailer;
use ocean_core::store::{MemoryStore, PgStore, Store};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,ocean_api=debug,ocean_core=debug";

/// CLI arguments. Each overrides the matching environment variable.
#[derive(Parser, Debug)]
#[command(name = "ocean_server", about = "Ocean Insight API server", version)]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Interface to bind.
    #[arg(long, env = "BIND_ADDR")]
    bind_addr: Option<String>,

    /// PostgreSQL connection URL. Without one, data lives in memory.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 10)]
    max_connections: u32,

    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_store(
    database_url: Option<&str>,
    max_connections: u32,
) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    let Some(url) = database_url else {
        warn!("DATABASE_URL not set; using the in-memory store, data will not persist");
        return Ok(Arc::new(MemoryStore::default()));
    };

    info!(max_connections, "connecting to PostgreSQL");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await?;

    info!("running database migrations");
    ocean_api::migrate(&pool).await?;

    Ok(Arc::new(PgStore::new(pool)))
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => {},
    }
    info!("shutdown signal received");
    token.cancel();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ApiConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind_addr) = args.bind_addr {
        config.bind_addr = bind_addr;
    }
    if args.database_url.is_some() {
        config.database_url = args.database_url;
    }
    info!(?config, "configuration loaded");

    let store = open_store(config.database_url.as_deref(), args.max_connections).await?;
    let mailer = Arc::new(TracingMailer::new(config.smtp.clone()));
    let listen_addr = config.listen_addr();
    let state = ocean_api::AppState::new(config, store, mailer);
    let app = ocean_api::router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!(addr = %listener.local_addr()?, version = ocean_core::version(), "REST API listening");

    let shutdown = CancellationToken::new();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await?;

    info!("server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_json);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}
