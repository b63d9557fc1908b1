//! Delete every persisted item (uninstall-style cleanup).

use crate::config::Config;
use crate::store::ItemStore;
use anyhow::Result;

pub async fn run() -> Result<()> {
    let config = Config::from_env();
    let mut store = ItemStore::open_in(&config.data_dir)?;
    let removed = store.delete_all()?;
    println!("  Removed {removed} item(s).");
    Ok(())
}
