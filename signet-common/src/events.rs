//! Event types for the signet player core
//!
//! Provides the `PlayerEvent` enum and the broadcast-backed `EventBus`.
//!
//! The event bus is the lossy, one-to-many informational surface: the
//! region scheduler emits lifecycle events here for any observer (host UI,
//! monitoring, tests) in addition to the synchronous per-region caller
//! notifications it delivers through its `RegionEvents` handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Player lifecycle events
///
/// Events are broadcast via the EventBus and can be serialized for
/// transmission to external observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// A region completed a full traversal of its playlist
    ///
    /// Fires once per wraparound, not per item start.
    RegionExpired {
        /// Region that expired
        region_id: String,
        /// When the traversal completed
        timestamp: DateTime<Utc>,
    },

    /// A region exhausted every candidate in its playlist without finding
    /// a playable item
    ///
    /// The owning layout decides remediation; the region itself goes idle.
    RegionUnplayable {
        /// Region that cannot play
        region_id: String,
        /// When exhaustion was detected
        timestamp: DateTime<Utc>,
    },

    /// A media item was started inside a region
    MediaStarted {
        /// Region the item plays in
        region_id: String,
        /// Playlist item id
        item_id: String,
        /// Seek offset the item was started at (seconds)
        position_secs: f64,
        /// When the item started
        timestamp: DateTime<Utc>,
    },

    /// A media item signalled completion
    ///
    /// Informational only; the scheduler decides whether to advance.
    MediaExpired {
        /// Region the item played in
        region_id: String,
        /// Playlist item id
        item_id: String,
        /// When the item completed
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast event bus
///
/// One-to-many fan-out over `tokio::sync::broadcast`. Subscribers that
/// fall behind lose the oldest buffered events; emission never blocks.
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, Box<PlayerEvent>> {
        self.tx.send(event).map_err(|e| Box::new(e.0))
    }

    /// Emit an event, ignoring the no-subscriber case
    ///
    /// Used on hot paths where delivery is best-effort.
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
