//! Mock simulation service for local development
//!
//! Serves the viewer's `/api` routes from a circular-orbit model.
//!
//! Usage: mock-backend [--bind 127.0.0.1:5000] [--fail-position]

use anyhow::Context;
use clap::Parser;
use orbit_viewer::infra::logging;
use orbit_viewer::io::mock_backend::{self, MockBackend};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "mock-backend", version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: String,

    /// Answer every position request with 503
    #[arg(long)]
    fail_position: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_stdout();
    let args = Args::parse();

    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    let backend = Arc::new(MockBackend::new());
    backend.set_fail_position(args.fail_position);
    info!(
        satellite = %backend.satellite_name(),
        fail_position = %args.fail_position,
        "mock_backend_configured"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    mock_backend::serve(listener, backend, shutdown_rx).await?;
    Ok(())
}
