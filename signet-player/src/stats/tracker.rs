//! Open-interval tracker
//!
//! The one structure shared across threads: the presentation thread opens
//! and closes intervals synchronously while closed records drain to the
//! stat writer over a channel. All map access is serialized behind a
//! single mutex; durable persistence happens after the lock is released,
//! so a slow store write never blocks playback-thread accounting.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use super::{Stat, StatKey, StatKind};

/// An interval that has been opened but not yet closed
#[derive(Debug)]
struct OpenInterval {
    kind: StatKind,
    from_dt: DateTime<Utc>,
    tag: Option<String>,
}

/// Concurrency-safe proof-of-play interval tracker
///
/// One explicitly-constructed instance per player session, shared into
/// the schedulers by `Arc`.
pub struct ProofOfPlayTracker {
    open: Mutex<HashMap<StatKey, OpenInterval>>,
    stats_enabled: AtomicBool,
    tx: mpsc::UnboundedSender<Stat>,
}

impl ProofOfPlayTracker {
    /// Create a tracker and the receiving end of its closed-interval
    /// channel
    ///
    /// The receiver is normally handed to a [`super::StatWriter`]; tests
    /// may drain it directly.
    pub fn new(stats_enabled: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<Stat>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let tracker = Arc::new(Self {
            open: Mutex::new(HashMap::new()),
            stats_enabled: AtomicBool::new(stats_enabled),
            tx,
        });
        (tracker, rx)
    }

    /// Global proof-of-play toggle, read at close time
    pub fn stats_enabled(&self) -> bool {
        self.stats_enabled.load(Ordering::Relaxed)
    }

    pub fn set_stats_enabled(&self, enabled: bool) {
        self.stats_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Open an interval
    ///
    /// A second open with the same key before the matching close loses
    /// the earlier interval (last writer wins) and is logged as an error.
    pub fn open(&self, kind: StatKind, schedule_id: i64, layout_id: i64, item_id: Option<&str>) {
        let key = StatKey {
            schedule_id,
            layout_id,
            item_id: item_id.map(str::to_string),
        };
        let interval = OpenInterval {
            kind,
            from_dt: Utc::now(),
            tag: None,
        };

        debug!(schedule_id, layout_id, item_id = ?key.item_id, "Opening stat interval");

        let mut open = lock_ignoring_poison(&self.open);
        if open.insert(key.clone(), interval).is_some() {
            error!(
                schedule_id,
                layout_id,
                item_id = ?key.item_id,
                "Opening stat interval over an existing open record; the earlier interval is lost"
            );
        }
    }

    /// Close an interval and hand it to the writer
    ///
    /// Persistence requires both the global toggle and the per-call
    /// `stats_enabled` flag; otherwise the interval is discarded.
    /// Closing a key with no matching open interval is an accounting
    /// anomaly: logged and ignored.
    pub fn close(&self, schedule_id: i64, layout_id: i64, item_id: Option<&str>, stats_enabled: bool) {
        let key = StatKey {
            schedule_id,
            layout_id,
            item_id: item_id.map(str::to_string),
        };

        // Stamp the close time inside the lock; everything else after it
        let closed = {
            let mut open = lock_ignoring_poison(&self.open);
            open.remove(&key).map(|interval| Stat {
                kind: interval.kind,
                from_dt: interval.from_dt,
                to_dt: Utc::now(),
                schedule_id,
                layout_id,
                item_id: key.item_id.clone(),
                tag: interval.tag,
            })
        };

        match closed {
            Some(stat) => {
                if self.stats_enabled() && stats_enabled {
                    if self.tx.send(stat).is_err() {
                        warn!("Stat writer has gone away; dropping stat record");
                    }
                } else {
                    debug!(
                        schedule_id,
                        layout_id,
                        item_id = ?key.item_id,
                        "Stats disabled, discarding closed interval"
                    );
                }
            }
            None => {
                error!(
                    schedule_id,
                    layout_id,
                    item_id = ?key.item_id,
                    "Closing stat record without an associated opening record"
                );
            }
        }
    }

    /// Number of currently open intervals
    pub fn open_count(&self) -> usize {
        lock_ignoring_poison(&self.open).len()
    }
}

/// Critical sections are a single insert or remove, so the map behind a
/// poisoned lock is still consistent.
fn lock_ignoring_poison<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_close_produces_one_stat() {
        let (tracker, mut rx) = ProofOfPlayTracker::new(true);

        tracker.open(StatKind::Item, 1, 2, Some("m1"));
        assert_eq!(tracker.open_count(), 1);

        std::thread::sleep(std::time::Duration::from_millis(2));
        tracker.close(1, 2, Some("m1"), true);
        assert_eq!(tracker.open_count(), 0);

        let stat = rx.try_recv().unwrap();
        assert_eq!(stat.kind, StatKind::Item);
        assert!(stat.from_dt < stat.to_dt);
        assert_eq!(stat.item_id.as_deref(), Some("m1"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_close_without_open_is_ignored() {
        let (tracker, mut rx) = ProofOfPlayTracker::new(true);
        tracker.close(1, 2, Some("m1"), true);
        assert!(rx.try_recv().is_err());
        assert_eq!(tracker.open_count(), 0);
    }

    #[test]
    fn test_double_open_keeps_last_writer() {
        let (tracker, mut rx) = ProofOfPlayTracker::new(true);

        tracker.open(StatKind::Item, 1, 2, Some("m1"));
        std::thread::sleep(std::time::Duration::from_millis(2));
        tracker.open(StatKind::Item, 1, 2, Some("m1"));
        assert_eq!(tracker.open_count(), 1);

        tracker.close(1, 2, Some("m1"), true);
        let stat = rx.try_recv().unwrap();
        // Exactly one record survives, and it is the later open
        assert!(rx.try_recv().is_err());
        assert!((stat.to_dt - stat.from_dt).num_milliseconds() < 2_000);
    }

    #[test]
    fn test_global_disable_discards() {
        let (tracker, mut rx) = ProofOfPlayTracker::new(false);
        tracker.open(StatKind::Item, 1, 2, Some("m1"));
        tracker.close(1, 2, Some("m1"), true);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_per_call_disable_discards() {
        let (tracker, mut rx) = ProofOfPlayTracker::new(true);
        tracker.open(StatKind::Item, 1, 2, Some("m1"));
        tracker.close(1, 2, Some("m1"), false);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_region_and_item_keys_are_disjoint() {
        let (tracker, mut rx) = ProofOfPlayTracker::new(true);

        tracker.open(StatKind::Region, 1, 2, None);
        tracker.open(StatKind::Item, 1, 2, Some("m1"));
        assert_eq!(tracker.open_count(), 2);

        tracker.close(1, 2, Some("m1"), true);
        tracker.close(1, 2, None, true);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.kind, StatKind::Item);
        assert_eq!(second.kind, StatKind::Region);
    }
}
