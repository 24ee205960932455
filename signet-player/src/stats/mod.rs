//! Proof-of-play accounting
//!
//! **Responsibilities:**
//! - Open/close interval tracking across threads ([`ProofOfPlayTracker`])
//! - Durable, append-only persistence of closed intervals ([`StatStore`])
//! - Background draining of closed intervals into the store ([`StatWriter`])
//!
//! Playback accuracy is best-effort relative to playback continuity: a
//! lost stat row is logged, never surfaced to the scheduler.

mod store;
mod tracker;

pub use store::{StatStore, StatWriter};
pub use tracker::ProofOfPlayTracker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a stat interval measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    /// A whole region/layout showing
    Region,

    /// A single playlist item showing
    Item,
}

impl StatKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatKind::Region => "region",
            StatKind::Item => "item",
        }
    }
}

/// Key identifying one open interval
///
/// Intervals are key-disjoint while open: a second open with the same key
/// before the matching close is a caller error (last writer wins).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatKey {
    pub schedule_id: i64,
    pub layout_id: i64,
    pub item_id: Option<String>,
}

/// A closed playback interval
///
/// Immutable once closed; persisted then discarded from memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stat {
    pub kind: StatKind,
    pub from_dt: DateTime<Utc>,
    pub to_dt: DateTime<Utc>,
    pub schedule_id: i64,
    pub layout_id: i64,
    pub item_id: Option<String>,
    pub tag: Option<String>,
}
