//! Snippetbox server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────▶ recovery → request log → security headers → timeout
//!                 │
//!                 ▼
//!              router ──▶ /static (ServeDir), /metrics
//!                 │
//!                 ▼
//!     session → CSRF → auth flag → [auth gate] → route metrics → handler
//!                                                                  │
//!                                      SnippetStore / UserStore ◀──┤
//!                                                                  ▼
//!     ◀────── buffered response ◀────────────────────── TemplateCache
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::net::TcpListener;

use snippetbox::config::{read_config, validated, AppConfig, ConfigError};
use snippetbox::models::{create_schema, SqliteSnippets, SqliteUsers};
use snippetbox::observability::{logging, metrics};
use snippetbox::session::{MemoryStore, SessionManager};
use snippetbox::templates::{DirSource, MemorySource, TemplateCache};
use snippetbox::{AppState, HttpServer, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "snippetbox", version, about = "Snippet sharing web application")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP network address; overrides `listener.bind_address`.
    #[arg(long)]
    addr: Option<String>,

    /// Database connection string; overrides `database.dsn`.
    #[arg(long)]
    dsn: Option<String>,
}

fn resolve_config(args: &Args) -> Result<AppConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(addr) = &args.addr {
        config.listener.bind_address = addr.clone();
    }
    if let Some(dsn) = &args.dsn {
        config.database.dsn = dsn.clone();
    }
    validated(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    logging::init(&config.observability.log_filter);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "snippetbox starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        templates = config.templates.dir.as_deref().unwrap_or("<embedded>"),
        "Configuration loaded"
    );

    let metrics = if config.observability.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.dsn)
        .await?;
    if config.database.create_schema {
        create_schema(&pool).await?;
    }
    tracing::info!("database pool ready");

    let templates = match &config.templates.dir {
        Some(dir) => TemplateCache::build(&DirSource::new(dir))?,
        None => TemplateCache::build(&MemorySource::embedded())?,
    };

    let sessions = SessionManager::new(MemoryStore::new(), &config.session);
    let shutdown = Shutdown::new();
    let sweeper = sessions.spawn_cleanup(
        Duration::from_secs(config.session.cleanup_interval_secs),
        shutdown.subscribe(),
    );

    let state = AppState {
        templates: Arc::new(templates),
        snippets: Arc::new(SqliteSnippets::new(pool.clone())),
        users: Arc::new(SqliteUsers::new(pool.clone()).with_cost(config.auth.bcrypt_cost)),
        sessions,
        metrics,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    HttpServer::new(state, &config).run(listener, shutdown).await?;

    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "session sweeper ended abnormally");
    }
    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
