mod cli;
mod config;
mod http;
mod operator;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use djo_observe::{init_local_offset, init_logger};

use crate::{cli::Cli, config::OperatorConfig, http::Health};

fn main() -> anyhow::Result<()> {
    // Offset detection only works while the process is single-threaded.
    init_local_offset();

    let cfg = Cli::parse().into_config()?;
    init_logger(&cfg.logger)?;
    info!(version = env!("CARGO_PKG_VERSION"), "djo-operator starting");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?
        .block_on(run(cfg))
}

async fn run(cfg: OperatorConfig) -> anyhow::Result<()> {
    let (controller, metrics) = operator::build(&cfg)?;
    let shutdown = CancellationToken::new();
    let health = Health::default();

    let listener = tokio::net::TcpListener::bind(cfg.metrics_addr)
        .await
        .with_context(|| format!("binding {}", cfg.metrics_addr))?;
    info!(addr = %cfg.metrics_addr, "serving /metrics, /healthz and /readyz");

    let server = tokio::spawn(
        axum::serve(listener, http::router(metrics, health.clone()))
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future(),
    );

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown requested");
        signal_token.cancel();
    });

    health.set_ready(true);
    controller.run(shutdown.clone()).await;
    health.set_ready(false);
    shutdown.cancel();

    server.await.context("metrics server task")??;
    info!("djo-operator stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable; waiting for ctrl-c only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
