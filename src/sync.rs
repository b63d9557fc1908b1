//! One fetch→parse→persist cycle over the feed.

use crate::events::{EventBus, FeedEvent};
use crate::session::controller::SessionController;
use crate::session::LoadOutcome;
use crate::store::ItemStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// What a completed sync cycle did to the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    /// The dataset was replaced with a fresh batch of n items.
    Replaced(usize),
    /// The feed was recognizably empty; the dataset was cleared.
    Cleared,
    /// Not logged in; the dataset was left untouched.
    SkippedNotAuthenticated,
    /// The page never settled into entries; the dataset was left untouched.
    SkippedNotReady,
}

/// Orchestrates sync cycles: fetch via the session controller, then replace
/// the persisted dataset atomically.
///
/// A fetch that produced no usable content never clears a previously healthy
/// dataset — stale data beats a destructive overwrite. Only a recognizably
/// empty feed clears it, as an explicit decision.
pub struct SyncCoordinator {
    session: Arc<SessionController>,
    store: Mutex<ItemStore>,
    feed_url: String,
    events: Arc<EventBus>,
}

impl SyncCoordinator {
    pub fn new(
        session: Arc<SessionController>,
        store: ItemStore,
        feed_url: String,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            session,
            store: Mutex::new(store),
            feed_url,
            events,
        }
    }

    /// Run one sync cycle. Callers must not overlap invocations; the
    /// scheduler runs ticks strictly serially.
    pub async fn sync(&self) -> Result<SyncReport> {
        self.events.emit(FeedEvent::SyncStarted);

        let outcome = match self.session.load(&self.feed_url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("sync fetch failed: {e:#}");
                self.events.emit(FeedEvent::SyncFailed {
                    error: format!("{e:#}"),
                });
                return Err(e);
            }
        };

        match outcome {
            LoadOutcome::Items(items) => {
                let count = items.len();
                self.replace(&items).await?;
                info!("sync replaced dataset with {count} item(s)");
                self.events.emit(FeedEvent::SyncComplete { items: count });
                Ok(SyncReport::Replaced(count))
            }
            LoadOutcome::Empty => {
                self.replace(&[]).await?;
                info!("feed is empty, dataset cleared");
                self.events.emit(FeedEvent::SyncComplete { items: 0 });
                Ok(SyncReport::Cleared)
            }
            LoadOutcome::NotAuthenticated => {
                warn!("sync skipped: not authenticated");
                self.events.emit(FeedEvent::SyncSkipped {
                    reason: "not authenticated".to_string(),
                });
                Ok(SyncReport::SkippedNotAuthenticated)
            }
            LoadOutcome::NotReady => {
                warn!("sync skipped: feed content not ready");
                self.events.emit(FeedEvent::SyncSkipped {
                    reason: "content not ready".to_string(),
                });
                Ok(SyncReport::SkippedNotReady)
            }
        }
    }

    async fn replace(&self, items: &[crate::item::FeedItem]) -> Result<()> {
        let mut store = self.store.lock().await;
        match store.replace_all(items).context("dataset replacement failed") {
            Ok(()) => Ok(()),
            Err(e) => {
                self.events.emit(FeedEvent::SyncFailed {
                    error: format!("{e:#}"),
                });
                Err(e)
            }
        }
    }

    /// Current dataset contents, in batch order.
    pub async fn items(&self) -> Result<Vec<crate::item::FeedItem>> {
        self.store.lock().await.list()
    }

    /// When the dataset was last replaced, if ever.
    pub async fn last_synced(&self) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        self.store.lock().await.last_synced()
    }
}
