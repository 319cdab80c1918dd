use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lan_share::listing::LinkBase;
use lan_share::{AppState, Config, ServedRoot, routes};

#[derive(Parser, Debug)]
#[command(name = "lan-share")]
#[command(about = "Share a local directory over HTTP with devices on the same network")]
#[command(version)]
struct Cli {
    /// Port to listen on (also used in shareable links)
    #[arg(short, long, env = "LANSHARE_PORT", default_value = "8080")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "LANSHARE_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Directory to share
    #[arg(short, long, env = "LANSHARE_ROOT", default_value = "files")]
    root: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, env = "LANSHARE_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "LANSHARE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "lan_share=debug,tower_http=debug"
    } else {
        "lan_share=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let config = match &cli.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => Config::default(),
    };
    let grace = Duration::from_secs(config.shutdown_grace_secs);

    let root = ServedRoot::new(&cli.root)
        .with_context(|| format!("opening served root {}", cli.root.display()))?;
    info!("Serving files from: {}", root.path().display());

    let state = AppState::new(root, cli.port, config);
    let app = routes::router(state);

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cli.bind, cli.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("Listening on {}", addr);
    info!("Share link: {}/", LinkBase::resolve(cli.port).url_for::<&str>(&[]));

    let stop = Arc::new(Notify::new());
    let stop_signal = stop.clone();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { stop_signal.notified().await });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server => {
            result.context("server task panicked")?.context("running server")?;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    info!("Shutdown signal received, draining for up to {:?}", grace);
    stop.notify_one();

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => result.context("server task panicked")?.context("running server")?,
        Err(_) => {
            warn!("Grace period elapsed, dropping remaining connections");
            server.abort();
        }
    }

    info!("Stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
