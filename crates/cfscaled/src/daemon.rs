//! Daemon wiring: platform client, autoscaler loop, operational API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};

use cfscale_autoscale::{AutoscaleStats, Autoscaler};
use cfscale_core::RuleSet;
use cfscale_platform::{CfClient, ClientConfig};

/// Runtime settings for [`run_daemon`].
pub struct DaemonConfig {
    pub port: u16,
    pub interval: Duration,
    pub client: ClientConfig,
}

/// Run the autoscaler and the API server until Ctrl-C.
pub async fn run_daemon(rules: RuleSet, config: DaemonConfig) -> anyhow::Result<()> {
    info!(
        api_url = %config.client.api_url,
        rules = rules.len(),
        "cfscale daemon starting"
    );
    if config.client.skip_ssl_validation {
        warn!("TLS certificate validation is disabled for the platform API");
    }

    let rules = Arc::new(rules);
    let client = CfClient::new(config.client).context("create platform client")?;
    let stats = Arc::new(AutoscaleStats::new());

    // Bind before starting the loop so a busy port fails fast.
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    // ── Autoscaler loop ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let autoscaler = Autoscaler::new(rules.clone(), Arc::new(client)).with_stats(stats.clone());
    let interval = config.interval;
    let autoscale_handle = tokio::spawn(async move {
        autoscaler.run(interval, shutdown_rx).await;
    });

    // ── API server ─────────────────────────────────────────────

    let router = cfscale_api::build_router(rules, stats);
    info!(%addr, "API server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await
        .context("API server")?;

    // The loop finishes its in-flight iteration before returning.
    let _ = autoscale_handle.await;

    info!("cfscale daemon stopped");
    Ok(())
}
