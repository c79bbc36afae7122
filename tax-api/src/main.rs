use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use tax_api::{AppState, ServerConfig, build_registry, logging, router};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Progressive income tax calculator.
///
/// Serves the calculation API and a browser form, backed by the configured
/// currency and bracket store. Flags override values from the config file.
#[derive(Debug, Parser)]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. `127.0.0.1:3000`.
    #[arg(long)]
    bind: Option<String>,

    /// Database backend to use (`sqlite` or `memory`).
    #[arg(long)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `taxes.db`) or `:memory:`.
    #[arg(long)]
    db: Option<String>,

    /// Currency used when a request does not name one.
    #[arg(long)]
    default_currency: Option<String>,

    /// Log level or filter directive.
    #[arg(long)]
    log_level: Option<String>,

    /// Append log output to this file as well as stdout.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(db) = self.db {
            config.db = db;
        }
        if let Some(currency) = self.default_currency {
            config.default_currency = currency;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file;
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.take().as_deref())?;
    cli.apply(&mut config);

    logging::init_logging(&config.log_level, config.log_file.as_deref())?;
    debug!(?config, "loaded configuration");

    let db_config = config.db_config();
    debug!("connecting to {} backend", db_config.backend);
    let registry = build_registry();
    let repo = registry.create(&db_config).await?;

    let state = AppState::new(Arc::from(repo), &config.default_currency);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("cannot bind to {}", config.bind))?;
    info!(
        address = %listener.local_addr()?,
        backend = %db_config.backend,
        default_currency = %config.default_currency,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
