//! # Signet Player Core
//!
//! Library core for unattended, long-running playback of heterogeneous
//! content inside fixed screen regions, with proof-of-play accounting.
//!
//! The two load-bearing pieces are:
//! - [`region::RegionScheduler`] — a retrying, self-healing state machine
//!   that walks an ordered, filterable, loopable playlist, survives
//!   per-item failures, and supports pause/interrupt/resume.
//! - [`stats::ProofOfPlayTracker`] — a concurrency-safe open/close
//!   interval tracker backed by a durable SQLite [`stats::StatStore`].
//!
//! Concrete renderers, content distribution and stat transmission live in
//! the host; this crate consumes them through the traits in [`content`].
//!
//! # Threading
//!
//! The scheduler is single-threaded by contract: it takes `&mut self` and
//! every transition is driven by the host's presentation thread. The
//! proof-of-play tracker is the one structure shared across threads.

pub mod content;
pub mod interrupt;
pub mod model;
pub mod options;
pub mod region;
pub mod stats;

pub use signet_common::{Error, Result};
