use anyhow::Result;
use psmon_collector::disk::DiskCollector;
use psmon_collector::system::collect_system_info;
use psmon_storage::{DiskUsageRepository, SqliteDiskUsageStore};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use psmon_server::app;
use psmon_server::config::ServerConfig;
use psmon_server::sampler::{DiskSampler, SamplerConfig};
use psmon_server::state::AppState;

const DEFAULT_CONFIG_PATH: &str = "config/server.toml";

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  psmon-server [config.toml]    Start the server (default: {DEFAULT_CONFIG_PATH})");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("psmon=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        Some(config_path) => run_server(ServerConfig::load(config_path)?).await,
        None => run_server(ServerConfig::load_or_default(DEFAULT_CONFIG_PATH)?).await,
    }
}

async fn run_server(config: ServerConfig) -> Result<()> {
    let store: Arc<dyn DiskUsageRepository> = Arc::new(SqliteDiskUsageStore::open(
        Path::new(&config.data_dir),
        &config.db_file,
    )?);

    let sampler = if config.sampler_enabled {
        let sampler = Arc::new(DiskSampler::new(
            store.clone(),
            Box::new(DiskCollector::new()),
            SamplerConfig::from_server_config(&config)?,
        )?);
        sampler.start();
        Some(sampler)
    } else {
        tracing::info!("Disk usage sampler disabled");
        None
    };

    let http_addr: SocketAddr = config.http_addr().parse()?;
    let state = AppState::new(
        config,
        store,
        Box::new(DiskCollector::new()),
        collect_system_info(),
        sampler.clone(),
    );
    let app = app::build_http_app(state);
    let http_listener = tokio::net::TcpListener::bind(http_addr).await?;

    tracing::info!(http = %http_addr, "Server started");

    let result = axum::serve(http_listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            tracing::info!("Shutting down gracefully");
        })
        .await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "HTTP server error");
    }

    if let Some(sampler) = sampler {
        sampler.stop().await;
    }
    tracing::info!("Server stopped");

    Ok(result?)
}
