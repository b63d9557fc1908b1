// Copyright 2026 Feedpanel Contributors
// SPDX-License-Identifier: Apache-2.0

//! Feedpanel event bus — typed events from every component.
//!
//! The bus is a `tokio::sync::broadcast` channel carrying [`FeedEvent`]
//! values. The display surface, the status command, and tests can subscribe
//! independently. When no subscribers exist, events are silently dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Every event the scrape-and-sync engine emits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeedEvent {
    // ── Sync events ───────────────────────
    /// A sync cycle has started.
    SyncStarted,
    /// A sync cycle replaced the dataset.
    SyncComplete { items: usize },
    /// A sync cycle ended without touching the dataset.
    SyncSkipped { reason: String },
    /// A sync cycle failed with an error.
    SyncFailed { error: String },

    // ── Session events ────────────────────
    /// A fresh hidden session was created.
    SessionCreated { generation: u64 },
    /// An existing warm session was reused without navigating.
    SessionReused,
    /// The hidden session was torn down after the idle window.
    SessionDisposed,

    // ── Auth events ───────────────────────
    /// An authentication probe completed.
    AuthProbe { authenticated: bool },
    /// The interactive login flow started.
    AuthStarted,
    /// The interactive login flow completed successfully.
    AuthComplete,
    /// The display surface should refresh its view of the dataset.
    PanelUpdated,
}

/// The central event bus.
///
/// All components emit through this bus; consumers subscribe to receive a
/// stream of all events.
pub struct EventBus {
    sender: broadcast::Sender<FeedEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers. Silently ignores if no subscribers.
    pub fn emit(&self, event: FeedEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
