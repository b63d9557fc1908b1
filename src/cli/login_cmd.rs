//! Interactive login flow in a visible browser window.

use crate::config::Config;
use crate::session::chromium::{ChromiumEngine, Visibility};
use crate::session::BrowserEngine;
use crate::sync::SyncReport;
use anyhow::{Context, Result};

pub async fn run() -> Result<()> {
    let config = Config::from_env();
    let engine = super::hidden_engine().await;
    let stack = super::build_stack(config, engine)?;

    let login_engine = ChromiumEngine::launch(Visibility::Visible)
        .await
        .context("cannot open a visible browser window for login")?;

    println!("  Opening {} …", stack.config.login_url());
    println!("  Log in in the browser window; it closes by itself when done.");
    stack.auth.authenticate(&login_engine).await?;
    println!("  Logged in.");

    // Mirror install-time behavior: refresh the dataset right away so the
    // panel has content as soon as login completes.
    match stack.coordinator.sync().await? {
        SyncReport::Replaced(n) => println!("  Dataset replaced: {n} item(s)"),
        report => println!("  Sync finished: {report:?}"),
    }

    stack.session.dispose().await;
    login_engine.shutdown().await?;
    Ok(())
}
