//! Show authentication state and dataset size.

use crate::config::Config;
use anyhow::Result;

pub async fn run() -> Result<()> {
    let config = Config::from_env();
    let engine = super::hidden_engine().await;
    let stack = super::build_stack(config, engine)?;

    let items = stack.coordinator.items().await?.len();
    let last_synced = stack.coordinator.last_synced().await?;
    let authenticated = stack.auth.is_authenticated().await.unwrap_or(false);

    println!("  Feed:          {}", stack.config.feed_url);
    println!(
        "  Authenticated: {}",
        if authenticated {
            "yes"
        } else {
            "no (run `feedpanel login`)"
        }
    );
    println!("  Dataset items: {items}");
    match last_synced {
        Some(ts) => println!("  Last sync:     {}", ts.to_rfc3339()),
        None => println!("  Last sync:     never"),
    }
    println!("  Sync interval: {}s", stack.config.sync_interval.as_secs());

    stack.session.dispose().await;
    Ok(())
}
