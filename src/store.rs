//! Panel dataset store backed by SQLite.
//!
//! The display surface reads this dataset as an ordered, read-only list.
//! Replacement is delete-then-insert inside a single transaction, so no
//! reader ever observes an empty dataset as a steady state of a successful
//! sync.

use crate::item::FeedItem;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Fixed dataset identifier, part of the schema contract with the panel.
pub const DATASET_ID: &str = "feedpanel.items";

/// Persisted item store for one dataset.
pub struct ItemStore {
    db: Connection,
}

impl ItemStore {
    /// Open or create the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Connection::open(path)
            .with_context(|| format!("failed to open item store: {}", path.display()))?;

        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS items (
                dataset TEXT NOT NULL,
                position INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                image_url TEXT,
                url TEXT NOT NULL,
                PRIMARY KEY (dataset, position)
            );
            CREATE TABLE IF NOT EXISTS sync_meta (
                dataset TEXT PRIMARY KEY,
                last_synced_at TEXT NOT NULL
            );",
        )
        .context("failed to create items table")?;

        Ok(Self { db })
    }

    /// Open the default store under the given data directory.
    pub fn open_in(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data dir: {}", data_dir.display()))?;
        Self::open(&data_dir.join("items.db"))
    }

    /// Open the default store at ~/.feedpanel/items.db.
    pub fn default_store() -> Result<Self> {
        let dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".feedpanel");
        Self::open_in(&dir)
    }

    /// Atomically replace the whole dataset with the given batch.
    ///
    /// Positional order is preserved. The delete and the inserts commit
    /// together or not at all.
    pub fn replace_all(&mut self, items: &[FeedItem]) -> Result<()> {
        let tx = self.db.transaction().context("failed to begin transaction")?;

        tx.execute("DELETE FROM items WHERE dataset = ?1", rusqlite::params![DATASET_ID])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO items (dataset, position, title, description, image_url, url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, item) in items.iter().enumerate() {
                stmt.execute(rusqlite::params![
                    DATASET_ID,
                    position as i64,
                    item.title,
                    item.description,
                    item.image_url,
                    item.url,
                ])?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO sync_meta (dataset, last_synced_at) VALUES (?1, ?2)",
            rusqlite::params![DATASET_ID, Utc::now().to_rfc3339()],
        )?;

        tx.commit().context("failed to commit dataset replacement")?;
        Ok(())
    }

    /// When the dataset was last replaced, if ever.
    pub fn last_synced(&self) -> Result<Option<DateTime<Utc>>> {
        let result = self.db.query_row(
            "SELECT last_synced_at FROM sync_meta WHERE dataset = ?1",
            rusqlite::params![DATASET_ID],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(ts) => Ok(Some(
                DateTime::parse_from_rfc3339(&ts)
                    .context("malformed last_synced_at timestamp")?
                    .with_timezone(&Utc),
            )),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All items in batch order.
    pub fn list(&self) -> Result<Vec<FeedItem>> {
        let mut stmt = self.db.prepare(
            "SELECT title, description, image_url, url FROM items
             WHERE dataset = ?1 ORDER BY position",
        )?;
        let items = stmt
            .query_map(rusqlite::params![DATASET_ID], |row| {
                Ok(FeedItem {
                    title: row.get(0)?,
                    description: row.get(1)?,
                    image_url: row.get(2)?,
                    url: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<FeedItem>, _>>()?;
        Ok(items)
    }

    /// Delete every persisted item. Used on uninstall-style cleanup.
    pub fn delete_all(&mut self) -> Result<usize> {
        let rows = self.db.execute(
            "DELETE FROM items WHERE dataset = ?1",
            rusqlite::params![DATASET_ID],
        )?;
        Ok(rows)
    }

    /// Number of persisted items.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM items WHERE dataset = ?1",
            rusqlite::params![DATASET_ID],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
