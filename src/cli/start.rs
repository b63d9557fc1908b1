//! Run the feedpanel daemon: initial sync, then the periodic scheduler.

use crate::config::Config;
use crate::scheduler;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{info, warn};

pub async fn run() -> Result<()> {
    let config = Config::from_env();
    info!("starting feedpanel v{}", env!("CARGO_PKG_VERSION"));
    info!("feed: {}", config.feed_url);

    let engine = super::hidden_engine().await;
    let stack = super::build_stack(config, engine)?;

    // Install-time behavior: probe auth, then refresh the dataset once
    // before the periodic schedule takes over.
    match stack.auth.is_authenticated().await {
        Ok(true) => match stack.coordinator.sync().await {
            Ok(report) => info!("initial sync finished: {report:?}"),
            Err(e) => warn!("initial sync failed: {e:#}"),
        },
        Ok(false) => {
            warn!("not authenticated — run `feedpanel login`");
            warn!("the panel will show its login prompt until then");
        }
        Err(e) => warn!("auth probe failed: {e:#}"),
    }

    let shutdown = Arc::new(Notify::new());
    let scheduler = scheduler::spawn(
        Arc::clone(&stack.coordinator),
        stack.config.sync_interval,
        Arc::clone(&shutdown),
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutting down");
    shutdown.notify_one();
    let _ = scheduler.await;
    stack.session.dispose().await;

    Ok(())
}
