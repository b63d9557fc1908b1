//! One-shot sync cycle.

use crate::config::Config;
use crate::sync::SyncReport;
use anyhow::Result;

pub async fn run() -> Result<()> {
    let config = Config::from_env();
    let engine = super::hidden_engine().await;
    let stack = super::build_stack(config, engine)?;

    let report = stack.coordinator.sync().await?;
    match report {
        SyncReport::Replaced(n) => println!("  Dataset replaced: {n} item(s)"),
        SyncReport::Cleared => println!("  Feed is empty: dataset cleared"),
        SyncReport::SkippedNotAuthenticated => {
            println!("  Skipped: not authenticated. Run `feedpanel login` first.")
        }
        SyncReport::SkippedNotReady => {
            println!("  Skipped: feed content not ready. Dataset left untouched.")
        }
    }

    stack.session.dispose().await;
    Ok(())
}
