//! Print the persisted dataset.

use crate::config::Config;
use crate::store::ItemStore;
use anyhow::Result;

pub async fn run(json: bool) -> Result<()> {
    let config = Config::from_env();
    let store = ItemStore::open_in(&config.data_dir)?;
    let items = store.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("  No items. Run `feedpanel sync`.");
        return Ok(());
    }

    for (i, item) in items.iter().enumerate() {
        println!("  {:>2}. {} — {}", i + 1, item.title, item.description);
        println!("      {}", item.url);
    }
    Ok(())
}
