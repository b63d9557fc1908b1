//! Browsing-session abstraction for headless page rendering.
//!
//! Defines the `BrowserEngine` and `BrowserPage` traits that abstract over
//! the browser (currently Chromium via chromiumoxide), the [`LoadOutcome`]
//! taxonomy, and the [`controller::SessionController`] that owns the single
//! hidden session.

pub mod chromium;
pub mod controller;

use crate::item::FeedItem;
use anyhow::Result;
use async_trait::async_trait;

/// Outcome of loading the feed and extracting from the rendered document.
///
/// Load failures are `Err` at the call site; everything that reached the
/// page stays distinguishable here, so callers never conflate "network
/// error" with "not logged in" with "empty feed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Extraction produced one or more items.
    Items(Vec<FeedItem>),
    /// The feed is recognizably empty (explicit empty-timeline marker).
    Empty,
    /// The final location was a blank/login sentinel: no active session.
    NotAuthenticated,
    /// The page never settled into entries within the settle budget.
    NotReady,
}

/// A browser that can open browsing surfaces (pages).
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Open a new page.
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>>;
    /// Shut down the browser.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently open pages.
    fn active_pages(&self) -> usize;
}

/// A single browsing surface.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate to a URL and wait for the document-loaded signal.
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<()>;
    /// Wait for the next completed navigation on this page.
    async fn wait_for_navigation(&self) -> Result<()>;
    /// The current location after any redirects.
    async fn current_url(&self) -> Result<String>;
    /// The full rendered document HTML.
    async fn html(&self) -> Result<String>;
    /// Close this page.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A no-op engine used when Chromium is unavailable.
///
/// Keeps the daemon and the status/items commands functional; every fetch
/// cycle fails until a browser is installed.
pub struct NoopEngine;

#[async_trait]
impl BrowserEngine for NoopEngine {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>> {
        Err(anyhow::anyhow!("browser not available"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_pages(&self) -> usize {
        0
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory engine for controller/auth/sync tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Shared script and counters for a [`MockEngine`].
    #[derive(Default)]
    pub struct MockState {
        /// Documents served by successive `html()` calls; the last one sticks.
        frames: Mutex<VecDeque<String>>,
        sticky: Mutex<String>,
        /// When set, every navigation lands on this URL instead of the target.
        pub redirect_to: Mutex<Option<String>>,
        /// When true, `navigate` fails.
        pub fail_navigation: AtomicBool,
        pub pages_created: AtomicUsize,
        pub pages_closed: AtomicUsize,
        pub navigations: AtomicUsize,
        /// Signals a completed navigation to `wait_for_navigation`.
        pub nav_signal: Notify,
    }

    impl MockState {
        pub fn push_frame(&self, html: &str) {
            self.frames.lock().unwrap().push_back(html.to_string());
        }

        pub fn set_sticky(&self, html: &str) {
            *self.sticky.lock().unwrap() = html.to_string();
        }

        pub fn set_redirect(&self, url: Option<&str>) {
            *self.redirect_to.lock().unwrap() = url.map(|s| s.to_string());
        }

        fn next_html(&self) -> String {
            if let Some(frame) = self.frames.lock().unwrap().pop_front() {
                return frame;
            }
            self.sticky.lock().unwrap().clone()
        }
    }

    pub struct MockEngine {
        pub state: Arc<MockState>,
    }

    impl MockEngine {
        pub fn new() -> Self {
            Self {
                state: Arc::new(MockState::default()),
            }
        }
    }

    #[async_trait]
    impl BrowserEngine for MockEngine {
        async fn new_page(&self) -> Result<Box<dyn BrowserPage>> {
            self.state.pages_created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockPage {
                state: Arc::clone(&self.state),
                location: Mutex::new(String::from("about:blank")),
            }))
        }

        async fn shutdown(&self) -> Result<()> {
            Ok(())
        }

        fn active_pages(&self) -> usize {
            self.state.pages_created.load(Ordering::SeqCst)
                - self.state.pages_closed.load(Ordering::SeqCst)
        }
    }

    pub struct MockPage {
        state: Arc<MockState>,
        location: Mutex<String>,
    }

    #[async_trait]
    impl BrowserPage for MockPage {
        async fn navigate(&self, url: &str, _timeout_ms: u64) -> Result<()> {
            if self.state.fail_navigation.load(Ordering::SeqCst) {
                anyhow::bail!("navigation failed: connection refused");
            }
            self.state.navigations.fetch_add(1, Ordering::SeqCst);
            let landed = self
                .state
                .redirect_to
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| url.to_string());
            *self.location.lock().unwrap() = landed;
            Ok(())
        }

        async fn wait_for_navigation(&self) -> Result<()> {
            self.state.nav_signal.notified().await;
            Ok(())
        }

        async fn current_url(&self) -> Result<String> {
            Ok(self.location.lock().unwrap().clone())
        }

        async fn html(&self) -> Result<String> {
            Ok(self.state.next_html())
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.state.pages_closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// A one-entry feed document in the scraped page's markup.
    pub fn ready_html() -> String {
        r#"<html><body>
            <div class="stream-tweet" href="/ada/status/1">
              <span class="full-name">Ada</span>
              <span class="screen-name">@ada</span>
              <div class="tweet-text">hello feed</div>
            </div></body></html>"#
            .to_string()
    }

    /// A document that has not finished rendering entries.
    pub fn blank_html() -> String {
        "<html><body><div id=\"app\"></div></body></html>".to_string()
    }

    /// A document carrying the explicit empty-timeline marker.
    pub fn empty_feed_html() -> String {
        r#"<html><body><div class="empty-timeline">No posts yet</div></body></html>"#.to_string()
    }
}
