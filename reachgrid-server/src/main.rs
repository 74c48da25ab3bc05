use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use reachgrid_server::{AppState, ServerConfig, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Serve population accessibility reports over HTTP
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: PathBuf,
    /// Override `server.bind` from the configuration
    #[arg(long)]
    bind: Option<SocketAddr>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let state = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || AppState::load(&config)).await??
    };
    let app = router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(config.server.bind).await?;
    info!(
        bind = %config.server.bind,
        concurrency_limit = config.server.concurrency_limit,
        "reachgrid server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
