//! The single hidden browsing session and its lifecycle.
//!
//! State machine: `Empty -> Loading -> Ready -> (idle timeout) -> Empty`,
//! with `Loading -> Empty` on load failure. Exactly one hidden page exists
//! process-wide; it is created lazily, reused while warm, and torn down
//! after an idle window measured from the last completed operation.

use crate::config::Config;
use crate::events::{EventBus, FeedEvent};
use crate::extract::{self, ExtractOutcome};
use crate::session::{BrowserEngine, BrowserPage, LoadOutcome};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Final locations that mean "no active session" rather than content.
const AUTH_SENTINELS: &[&str] = &["/login", "/session/new", "/i/flow/login"];

/// Owns the hidden browsing session: loads the feed URL, applies the settle
/// policy, invokes the extractor, and arms idle disposal.
///
/// Loads are serialized by an async mutex over the page slot, so at most one
/// is in flight per process. A pending load always settles; timeouts are
/// wait-then-check, never abortable operations.
pub struct SessionController {
    engine: Arc<dyn BrowserEngine>,
    feed_base: String,
    settle: Duration,
    settle_poll: Duration,
    idle_disposal: Duration,
    nav_timeout_ms: u64,
    slot: Arc<Mutex<Option<Box<dyn BrowserPage>>>>,
    /// Bumped on every operation; pending disposal timers compare against it.
    op_seq: Arc<AtomicU64>,
    /// Bumped whenever a fresh session is created.
    generation: Arc<AtomicU64>,
    events: Arc<EventBus>,
}

impl SessionController {
    pub fn new(engine: Arc<dyn BrowserEngine>, cfg: &Config, events: Arc<EventBus>) -> Self {
        Self {
            engine,
            feed_base: cfg.feed_url.clone(),
            settle: cfg.settle,
            settle_poll: cfg.settle_poll,
            idle_disposal: cfg.idle_disposal,
            nav_timeout_ms: cfg.nav_timeout.as_millis() as u64,
            slot: Arc::new(Mutex::new(None)),
            op_seq: Arc::new(AtomicU64::new(0)),
            generation: Arc::new(AtomicU64::new(0)),
            events,
        }
    }

    /// How many times a fresh session has been created. Monotone; observable
    /// proof that idle disposal actually recycled the session.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Load `url` in the hidden session and extract feed entries.
    ///
    /// Creates the session lazily; when one is already warm, navigation is
    /// skipped and extraction re-runs against the current document. Every
    /// completion re-arms the idle-disposal timer.
    pub async fn load(&self, url: &str) -> Result<LoadOutcome> {
        let mut slot = self.slot.lock().await;
        // Cancels any pending disposal for the previous operation.
        let seq = self.op_seq.fetch_add(1, Ordering::SeqCst) + 1;

        if slot.is_none() {
            let page = self
                .engine
                .new_page()
                .await
                .context("failed to create hidden session")?;
            if let Err(e) = page.navigate(url, self.nav_timeout_ms).await {
                // Loading -> Empty: discard the half-built session.
                let _ = page.close().await;
                return Err(e).context("navigation failed");
            }
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            debug!("hidden session created (generation {generation})");
            self.events.emit(FeedEvent::SessionCreated { generation });
            *slot = Some(page);
        } else {
            debug!("reusing warm session, skipping navigation");
            self.events.emit(FeedEvent::SessionReused);
        }

        let Some(page) = slot.as_deref() else {
            anyhow::bail!("session slot empty after create");
        };
        let outcome = self.settle_and_extract(page).await;

        match outcome {
            Ok(outcome) => {
                self.arm_disposal(seq);
                Ok(outcome)
            }
            Err(e) => {
                // The document became unreadable; drop the session so the
                // next load starts fresh.
                if let Some(page) = slot.take() {
                    let _ = page.close().await;
                    self.events.emit(FeedEvent::SessionDisposed);
                }
                Err(e)
            }
        }
    }

    /// Force-close the current session immediately. The next `load` creates
    /// a fresh one. Used by authentication probes.
    pub async fn dispose(&self) {
        self.op_seq.fetch_add(1, Ordering::SeqCst);
        let mut slot = self.slot.lock().await;
        if let Some(page) = slot.take() {
            if let Err(e) = page.close().await {
                warn!("failed to close session: {e:#}");
            }
            self.events.emit(FeedEvent::SessionDisposed);
        }
    }

    /// Check the final location, then poll the extractor until the feed
    /// settles or the budget runs out.
    async fn settle_and_extract(&self, page: &dyn BrowserPage) -> Result<LoadOutcome> {
        let location = page.current_url().await.unwrap_or_default();
        if is_auth_sentinel(&location) {
            debug!("landed on auth sentinel: {location}");
            return Ok(LoadOutcome::NotAuthenticated);
        }

        // Wait-then-check settle policy: client-side rendering populates the
        // feed some time after the document-loaded signal, so keep checking
        // for entry nodes until the settle budget is spent.
        let deadline = Instant::now() + self.settle;
        loop {
            let html = page.html().await.context("failed to read document")?;
            match extract::extract(&html, &self.feed_base) {
                ExtractOutcome::Ready(items) => return Ok(LoadOutcome::Items(items)),
                ExtractOutcome::Empty => return Ok(LoadOutcome::Empty),
                ExtractOutcome::NotReady => {
                    if Instant::now() + self.settle_poll > deadline {
                        return Ok(LoadOutcome::NotReady);
                    }
                    tokio::time::sleep(self.settle_poll).await;
                }
            }
        }
    }

    /// Tear the session down after the idle window unless a newer operation
    /// arrives first.
    fn arm_disposal(&self, seq: u64) {
        let slot = Arc::clone(&self.slot);
        let op_seq = Arc::clone(&self.op_seq);
        let events = Arc::clone(&self.events);
        let idle = self.idle_disposal;
        tokio::spawn(async move {
            tokio::time::sleep(idle).await;
            if op_seq.load(Ordering::SeqCst) != seq {
                return; // a newer operation took over
            }
            let mut slot = slot.lock().await;
            if op_seq.load(Ordering::SeqCst) != seq {
                return;
            }
            if let Some(page) = slot.take() {
                let _ = page.close().await;
                debug!("hidden session disposed after idle window");
                events.emit(FeedEvent::SessionDisposed);
            }
        });
    }
}

fn is_auth_sentinel(location: &str) -> bool {
    if location == "about:blank" {
        return true;
    }
    AUTH_SENTINELS.iter().any(|s| location.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{blank_html, empty_feed_html, ready_html, MockEngine};
    use std::sync::atomic::Ordering as AtomicOrdering;

    const FEED: &str = "https://mobile.example.com";

    fn test_config() -> Config {
        let mut cfg = Config::from_env();
        cfg.feed_url = FEED.to_string();
        cfg.settle = Duration::from_millis(100);
        cfg.settle_poll = Duration::from_millis(10);
        cfg.idle_disposal = Duration::from_millis(60);
        cfg
    }

    fn controller(engine: &Arc<MockEngine>, cfg: &Config) -> SessionController {
        SessionController::new(
            Arc::clone(engine) as Arc<dyn BrowserEngine>,
            cfg,
            Arc::new(EventBus::new(64)),
        )
    }

    #[tokio::test]
    async fn test_load_extracts_items() {
        let engine = Arc::new(MockEngine::new());
        engine.state.set_sticky(&ready_html());
        let ctl = controller(&engine, &test_config());

        match ctl.load(FEED).await.unwrap() {
            LoadOutcome::Items(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].title, "Ada");
                assert_eq!(items[0].url, "https://mobile.example.com/ada/status/1");
            }
            other => panic!("expected Items, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_load_reuses_warm_session() {
        let engine = Arc::new(MockEngine::new());
        engine.state.set_sticky(&ready_html());
        let ctl = controller(&engine, &test_config());

        ctl.load(FEED).await.unwrap();
        ctl.load(FEED).await.unwrap();

        // One page, one navigation: the second load re-extracted in place.
        assert_eq!(engine.state.pages_created.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(engine.state.navigations.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(ctl.generation(), 1);
    }

    #[tokio::test]
    async fn test_idle_disposal_recycles_session() {
        let engine = Arc::new(MockEngine::new());
        engine.state.set_sticky(&ready_html());
        let ctl = controller(&engine, &test_config());

        ctl.load(FEED).await.unwrap();
        assert_eq!(ctl.generation(), 1);

        // Wait past the idle window; the session must be torn down.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(engine.state.pages_closed.load(AtomicOrdering::SeqCst), 1);

        // The next load creates a fresh session.
        ctl.load(FEED).await.unwrap();
        assert_eq!(engine.state.pages_created.load(AtomicOrdering::SeqCst), 2);
        assert_eq!(ctl.generation(), 2);
    }

    #[tokio::test]
    async fn test_new_load_cancels_pending_disposal() {
        let engine = Arc::new(MockEngine::new());
        engine.state.set_sticky(&ready_html());
        let ctl = controller(&engine, &test_config());

        ctl.load(FEED).await.unwrap();
        // Re-load inside the idle window, then wait out the original timer.
        tokio::time::sleep(Duration::from_millis(30)).await;
        ctl.load(FEED).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        // The first timer must not have fired against the reused session.
        assert_eq!(engine.state.pages_closed.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auth_sentinel_yields_not_authenticated() {
        let engine = Arc::new(MockEngine::new());
        engine
            .state
            .set_redirect(Some("https://mobile.example.com/session/new"));
        let ctl = controller(&engine, &test_config());

        assert_eq!(
            ctl.load(FEED).await.unwrap(),
            LoadOutcome::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn test_settle_poll_waits_for_rendering() {
        let engine = Arc::new(MockEngine::new());
        // Two not-ready frames before entries appear.
        engine.state.push_frame(&blank_html());
        engine.state.push_frame(&blank_html());
        engine.state.set_sticky(&ready_html());
        let ctl = controller(&engine, &test_config());

        match ctl.load(FEED).await.unwrap() {
            LoadOutcome::Items(items) => assert_eq!(items.len(), 1),
            other => panic!("expected Items, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_settle_budget_exhausted_yields_not_ready() {
        let engine = Arc::new(MockEngine::new());
        engine.state.set_sticky(&blank_html());
        let ctl = controller(&engine, &test_config());

        assert_eq!(ctl.load(FEED).await.unwrap(), LoadOutcome::NotReady);
    }

    #[tokio::test]
    async fn test_empty_marker_yields_empty() {
        let engine = Arc::new(MockEngine::new());
        engine.state.set_sticky(&empty_feed_html());
        let ctl = controller(&engine, &test_config());

        assert_eq!(ctl.load(FEED).await.unwrap(), LoadOutcome::Empty);
    }

    #[tokio::test]
    async fn test_navigation_failure_leaves_slot_empty() {
        let engine = Arc::new(MockEngine::new());
        engine
            .state
            .fail_navigation
            .store(true, AtomicOrdering::SeqCst);
        let ctl = controller(&engine, &test_config());

        assert!(ctl.load(FEED).await.is_err());

        // Recovery: once navigation works again, a fresh session is created.
        engine
            .state
            .fail_navigation
            .store(false, AtomicOrdering::SeqCst);
        engine.state.set_sticky(&ready_html());
        assert!(matches!(
            ctl.load(FEED).await.unwrap(),
            LoadOutcome::Items(_)
        ));
        assert_eq!(ctl.generation(), 1);
    }

    #[tokio::test]
    async fn test_dispose_closes_page() {
        let engine = Arc::new(MockEngine::new());
        engine.state.set_sticky(&ready_html());
        let ctl = controller(&engine, &test_config());

        ctl.load(FEED).await.unwrap();
        ctl.dispose().await;
        assert_eq!(engine.state.pages_closed.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(engine.active_pages(), 0);
    }
}
