//! Runtime configuration, read from `FEEDPANEL_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_FEED_URL: &str = "https://mobile.twitter.com";
const DEFAULT_LOGIN_PATH: &str = "/session/new";
const DEFAULT_SETTLE_MS: u64 = 5000;
const DEFAULT_SETTLE_POLL_MS: u64 = 500;
const DEFAULT_IDLE_DISPOSAL_SECS: u64 = 10;
const DEFAULT_NAV_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 3600;
const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 300;

/// Full runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Entry-point address of the scraped mobile feed.
    pub feed_url: String,
    /// Path appended to `feed_url` for the interactive login page.
    pub login_path: String,
    /// Total budget for the post-navigation settle poll.
    pub settle: Duration,
    /// Interval between extraction attempts while settling.
    pub settle_poll: Duration,
    /// Inactivity window after which the hidden session is torn down.
    pub idle_disposal: Duration,
    /// Navigation timeout.
    pub nav_timeout: Duration,
    /// Interval between scheduled sync cycles.
    pub sync_interval: Duration,
    /// How long the interactive login flow may run before giving up.
    pub login_timeout: Duration,
    /// Directory holding the panel dataset.
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            feed_url: read_env_string("FEEDPANEL_FEED_URL")
                .unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            login_path: read_env_string("FEEDPANEL_LOGIN_PATH")
                .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
            settle: Duration::from_millis(read_env_u64("FEEDPANEL_SETTLE_MS", DEFAULT_SETTLE_MS)),
            settle_poll: Duration::from_millis(
                read_env_u64("FEEDPANEL_SETTLE_POLL_MS", DEFAULT_SETTLE_POLL_MS).max(10),
            ),
            idle_disposal: Duration::from_secs(read_env_u64(
                "FEEDPANEL_IDLE_DISPOSAL_SECS",
                DEFAULT_IDLE_DISPOSAL_SECS,
            )),
            nav_timeout: Duration::from_millis(read_env_u64(
                "FEEDPANEL_NAV_TIMEOUT_MS",
                DEFAULT_NAV_TIMEOUT_MS,
            )),
            sync_interval: Duration::from_secs(
                read_env_u64("FEEDPANEL_SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS).max(1),
            ),
            login_timeout: Duration::from_secs(read_env_u64(
                "FEEDPANEL_LOGIN_TIMEOUT_SECS",
                DEFAULT_LOGIN_TIMEOUT_SECS,
            )),
            data_dir: resolve_data_dir(),
        }
    }

    /// Full URL of the interactive login page.
    pub fn login_url(&self) -> String {
        format!(
            "{}{}",
            self.feed_url.trim_end_matches('/'),
            self.login_path
        )
    }
}

fn resolve_data_dir() -> PathBuf {
    if let Some(custom) = read_env_string("FEEDPANEL_DATA_DIR") {
        if !custom.is_empty() {
            return PathBuf::from(custom);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".feedpanel")
}

fn read_env_u64(name: &str, default_value: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_value)
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_joins_path() {
        let mut cfg = Config::from_env();
        cfg.feed_url = "https://mobile.example.com/".to_string();
        cfg.login_path = "/session/new".to_string();
        assert_eq!(cfg.login_url(), "https://mobile.example.com/session/new");
    }

    #[test]
    fn test_defaults() {
        // Only assert env-independent defaults here.
        let cfg = Config {
            feed_url: DEFAULT_FEED_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            settle_poll: Duration::from_millis(DEFAULT_SETTLE_POLL_MS),
            idle_disposal: Duration::from_secs(DEFAULT_IDLE_DISPOSAL_SECS),
            nav_timeout: Duration::from_millis(DEFAULT_NAV_TIMEOUT_MS),
            sync_interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            login_timeout: Duration::from_secs(DEFAULT_LOGIN_TIMEOUT_SECS),
            data_dir: PathBuf::from("."),
        };
        assert_eq!(cfg.settle.as_secs(), 5);
        assert_eq!(cfg.idle_disposal.as_secs(), 10);
        assert_eq!(cfg.sync_interval.as_secs(), 3600);
    }
}
