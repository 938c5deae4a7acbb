//! upwatchd — the upwatch daemon.
//!
//! One binary, three deployment shapes:
//! - `serve`: state store + result pipeline + REST API.
//! - `worker`: probe runner driving a remote API over HTTP.
//! - `standalone`: everything in one process, worker wired straight into
//!   the store and pipeline.
//!
//! # Usage
//!
//! ```text
//! upwatchd serve --port 8080 --data-dir /var/lib/upwatch --token <secret>
//! upwatchd worker --api-host http://monitor.internal:8080 --token <secret>
//! upwatchd standalone --port 8080 --data-dir /var/lib/upwatch --token <secret>
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use upwatch_api::ApiState;
use upwatch_pipeline::{LogNotifier, ResultPipeline};
use upwatch_probe::ProbeClient;
use upwatch_state::StateStore;
use upwatch_worker::{HttpControlPlane, LocalControlPlane, Runner};

#[derive(Parser)]
#[command(name = "upwatchd", about = "upwatch uptime-monitoring daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server backed by the embedded state store.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/upwatch")]
        data_dir: PathBuf,

        /// Pre-shared token required on every API request.
        #[arg(long)]
        token: String,
    },

    /// Run the probe worker against a remote API server.
    Worker {
        /// Base URL of the API server.
        #[arg(long)]
        api_host: String,

        /// Pre-shared token sent on every API request.
        #[arg(long)]
        token: String,

        /// Delay between probe cycles in seconds.
        #[arg(long, default_value = "300")]
        interval_secs: u64,
    },

    /// Run the API server and the probe worker in one process.
    Standalone {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/upwatch")]
        data_dir: PathBuf,

        /// Pre-shared token required on every API request.
        #[arg(long)]
        token: String,

        /// Delay between probe cycles in seconds.
        #[arg(long, default_value = "300")]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,upwatchd=debug,upwatch=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            data_dir,
            token,
        } => run_serve(port, data_dir, token).await,
        Command::Worker {
            api_host,
            token,
            interval_secs,
        } => run_worker(api_host, token, interval_secs).await,
        Command::Standalone {
            port,
            data_dir,
            token,
            interval_secs,
        } => run_standalone(port, data_dir, token, interval_secs).await,
    }
}

fn open_store(data_dir: &Path) -> anyhow::Result<StateStore> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("upwatch.redb");
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");
    Ok(store)
}

async fn run_serve(port: u16, data_dir: PathBuf, token: String) -> anyhow::Result<()> {
    info!("upwatch API server starting");

    let store = open_store(&data_dir)?;
    let pipeline = ResultPipeline::new(store.clone(), Arc::new(LogNotifier));
    let router = upwatch_api::build_router(ApiState {
        store,
        pipeline,
        token,
    });

    serve_api(router, port, None).await
}

async fn run_worker(api_host: String, token: String, interval_secs: u64) -> anyhow::Result<()> {
    info!(%api_host, interval_secs, "upwatch worker starting");

    let plane = Arc::new(HttpControlPlane::new(api_host, token));
    let prober = ProbeClient::new()?;
    let runner = Runner::new(plane, prober, Duration::from_secs(interval_secs));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    runner.run(shutdown_rx).await;
    info!("upwatch worker stopped");
    Ok(())
}

async fn run_standalone(
    port: u16,
    data_dir: PathBuf,
    token: String,
    interval_secs: u64,
) -> anyhow::Result<()> {
    info!("upwatch daemon starting in standalone mode");

    let store = open_store(&data_dir)?;
    let pipeline = ResultPipeline::new(store.clone(), Arc::new(LogNotifier));

    // Worker wired directly into the store and pipeline.
    let plane = Arc::new(LocalControlPlane::new(store.clone(), pipeline.clone()));
    let prober = ProbeClient::new()?;
    let runner = Runner::new(plane, prober, Duration::from_secs(interval_secs));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(async move {
        runner.run(shutdown_rx).await;
    });

    let router = upwatch_api::build_router(ApiState {
        store,
        pipeline,
        token,
    });
    serve_api(router, port, Some(shutdown_tx)).await?;

    let _ = worker_handle.await;
    info!("upwatch daemon stopped");
    Ok(())
}

async fn serve_api(
    router: axum::Router,
    port: u16,
    shutdown_tx: Option<watch::Sender<bool>>,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
            }
            if let Some(tx) = shutdown_tx {
                let _ = tx.send(true);
            }
        })
        .await?;

    Ok(())
}
