//! CLI subcommand implementations for the feedpanel binary.

pub mod clear_cmd;
pub mod items_cmd;
pub mod login_cmd;
pub mod start;
pub mod status_cmd;
pub mod sync_cmd;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::events::EventBus;
use crate::session::chromium::{ChromiumEngine, Visibility};
use crate::session::controller::SessionController;
use crate::session::{BrowserEngine, NoopEngine};
use crate::store::ItemStore;
use crate::sync::SyncCoordinator;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// The wired-up scrape-and-sync stack shared by the subcommands.
pub struct Stack {
    pub config: Config,
    pub events: Arc<EventBus>,
    pub session: Arc<SessionController>,
    pub auth: Arc<Authenticator>,
    pub coordinator: Arc<SyncCoordinator>,
}

/// Build the stack on the given hidden-session engine.
pub fn build_stack(config: Config, engine: Arc<dyn BrowserEngine>) -> Result<Stack> {
    let events = Arc::new(EventBus::default());
    let session = Arc::new(SessionController::new(engine, &config, Arc::clone(&events)));
    let store = ItemStore::open_in(&config.data_dir)?;
    let auth = Arc::new(Authenticator::new(
        Arc::clone(&session),
        &config,
        Arc::clone(&events),
    ));
    let coordinator = Arc::new(SyncCoordinator::new(
        Arc::clone(&session),
        store,
        config.feed_url.clone(),
        Arc::clone(&events),
    ));
    Ok(Stack {
        config,
        events,
        session,
        auth,
        coordinator,
    })
}

/// Launch the hidden Chromium engine, degrading to the no-op engine so the
/// dataset commands keep working when no browser is installed.
pub async fn hidden_engine() -> Arc<dyn BrowserEngine> {
    match ChromiumEngine::launch(Visibility::Hidden).await {
        Ok(engine) => {
            info!("Chromium engine initialized");
            Arc::new(engine)
        }
        Err(e) => {
            warn!("Chromium unavailable: {e:#}");
            warn!("fetch cycles will fail until a browser is installed");
            Arc::new(NoopEngine)
        }
    }
}
