//! Authentication state probing and the interactive login flow.
//!
//! Authentication state is derived, never cached: every probe force-disposes
//! the hidden session and performs a fresh load of the feed root.

use crate::config::Config;
use crate::events::{EventBus, FeedEvent};
use crate::session::controller::SessionController;
use crate::session::{BrowserEngine, LoadOutcome};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Drives authentication probes and the interactive login sub-flow.
pub struct Authenticator {
    session: Arc<SessionController>,
    feed_url: String,
    login_url: String,
    login_timeout: Duration,
    nav_timeout_ms: u64,
    events: Arc<EventBus>,
}

impl Authenticator {
    pub fn new(session: Arc<SessionController>, cfg: &Config, events: Arc<EventBus>) -> Self {
        Self {
            session,
            feed_url: cfg.feed_url.clone(),
            login_url: cfg.login_url(),
            login_timeout: cfg.login_timeout,
            nav_timeout_ms: cfg.nav_timeout.as_millis() as u64,
            events,
        }
    }

    /// Probe the current authentication state with a fresh session.
    ///
    /// Item data — possibly an empty feed — means authenticated; landing on
    /// a login sentinel or a page that never settles means not. A load
    /// failure is not an auth verdict and propagates as an error.
    pub async fn is_authenticated(&self) -> Result<bool> {
        self.session.dispose().await;
        let verdict = match self.session.load(&self.feed_url).await? {
            LoadOutcome::Items(_) | LoadOutcome::Empty => true,
            LoadOutcome::NotAuthenticated | LoadOutcome::NotReady => false,
        };
        debug!("auth probe: authenticated={verdict}");
        self.events.emit(FeedEvent::AuthProbe {
            authenticated: verdict,
        });
        Ok(verdict)
    }

    /// Run the interactive login flow on a visible browsing surface.
    ///
    /// Opens the login page in `login_engine` and re-probes the auth state
    /// after each completed navigation (probes are idempotent, so repeated
    /// terminal transitions before the user finishes are harmless). Returns
    /// once authenticated; completes at most once per call.
    pub async fn authenticate(&self, login_engine: &dyn BrowserEngine) -> Result<()> {
        if self.is_authenticated().await? {
            info!("already authenticated");
            self.events.emit(FeedEvent::AuthComplete);
            return Ok(());
        }

        self.events.emit(FeedEvent::AuthStarted);
        let page = login_engine
            .new_page()
            .await
            .context("failed to open login page")?;
        if let Err(e) = page.navigate(&self.login_url, self.nav_timeout_ms).await {
            let _ = page.close().await;
            return Err(e).context("failed to load login page");
        }
        info!("login page opened at {}", self.login_url);

        let deadline = Instant::now() + self.login_timeout;
        let result = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break Err(anyhow::anyhow!(
                    "login timed out after {}s",
                    self.login_timeout.as_secs()
                ));
            }
            match tokio::time::timeout(remaining, page.wait_for_navigation()).await {
                Err(_) => {
                    break Err(anyhow::anyhow!(
                        "login timed out after {}s",
                        self.login_timeout.as_secs()
                    ));
                }
                Ok(Err(e)) => break Err(e).context("login page navigation failed"),
                Ok(Ok(())) => {}
            }
            match self.is_authenticated().await {
                Ok(true) => break Ok(()),
                Ok(false) => debug!("login not complete yet, waiting for next navigation"),
                Err(e) => break Err(e),
            }
        };

        let _ = page.close().await;

        if result.is_ok() {
            info!("login complete");
            // Tell the display surface to refresh its view.
            self.events.emit(FeedEvent::PanelUpdated);
            self.events.emit(FeedEvent::AuthComplete);
        }
        result
    }
}

/// Blocking adapter for hosts whose capability callbacks cannot await.
///
/// Parks the current worker thread while the asynchronous probe settles.
/// Legacy-compat only: it requires the multi-threaded runtime and burns a
/// worker for the duration of the probe. New callers should use
/// [`Authenticator::is_authenticated`] directly.
pub fn is_authenticated_blocking(auth: &Authenticator) -> Result<bool> {
    tokio::task::block_in_place(|| {
        tokio::runtime::Handle::current().block_on(auth.is_authenticated())
    })
}
