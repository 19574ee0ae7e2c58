use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use perch::{
    AppState, SharedState, api, config::AppConfig, db, dns::update::Rfc2136Client,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, rename_all = "kebab-case")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, value_name = "PATH")]
    db_path: PathBuf,
    /// Listen address for the HTTP server
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,
    /// TTL in seconds for records pushed into the zones
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    record_ttl: u32,
    /// Per-request deadline in seconds for nameserver interactions
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    dns_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let state = init_shared_state(&cli).await?;

    let app = api::create_router(state);

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind to {}", cli.listen))?;

    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server exited with error")?;

    Ok(())
}

async fn init_shared_state(cli: &Cli) -> Result<SharedState> {
    if let Some(parent) = cli.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create db directory {}", parent.display()))?;
    }

    let config = AppConfig {
        record_ttl: cli.record_ttl,
        dns_timeout: Duration::from_secs(cli.dns_timeout),
    };

    let db = db::init_db(&cli.db_path).await?;
    let dns = Rfc2136Client::new(config.dns_timeout, config.record_ttl);

    Ok(Arc::new(AppState {
        config,
        db,
        dns: Arc::new(dns),
    }))
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("failed to install CTRL+C handler: {err}");
    }
    info!("shutdown signal received");
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
