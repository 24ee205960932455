//! Content item capability boundary
//!
//! Concrete renderers (image/video/web/...) live in the host and are
//! selected by a [`ContentFactory`] keyed on the working options' type
//! tag. The scheduler sees content only through the capability set below.

use crate::model::RegionGeometry;
use crate::options::WorkingOptions;
use crate::Result;

/// How an item is being stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBehaviour {
    /// Normal end-of-slot stop; the item may run its exit transition
    Graceful,

    /// The region is being paused or torn down; stop immediately
    Forced,
}

/// One live playback slot
///
/// Created by the factory, exclusively owned by the scheduler (or the
/// audio overlay sequencer) until explicitly stopped; never shared.
///
/// Completion is signalled out-of-band: the host routes the item's
/// duration-elapsed signal back into
/// [`crate::region::RegionScheduler::on_media_elapsed`].
pub trait ContentItem: Send {
    /// Playlist item id this slot was created for
    fn item_id(&self) -> &str;

    /// Make the item visible/audible, seeking to `position_secs`
    fn render(&mut self, position_secs: f64) -> Result<()>;

    /// Current playback position in seconds (for pause/resume)
    fn current_playtime(&self) -> f64;

    /// Stop playback
    fn stop(&mut self, behaviour: StopBehaviour) -> Result<()>;

    /// Final teardown acknowledgement; always called after `stop`,
    /// successful or not
    fn stopped(&mut self);

    /// Whether this item needs the full player surface instead of the
    /// region geometry
    fn region_size_change_required(&self) -> bool {
        false
    }
}

/// Constructs content items for working options
///
/// Must be side-effect-free on failure: a failed `create` leaves no
/// partially-attached item behind.
pub trait ContentFactory: Send + Sync {
    fn create(
        &self,
        options: &WorkingOptions,
        geometry: RegionGeometry,
    ) -> Result<Box<dyn ContentItem>>;
}

/// What went wrong with an item, for temporary-failure bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The factory could not construct the item
    Construction,

    /// The item was constructed but failed to start
    Start,
}

/// Content cache and temporary-failure blacklist
pub trait ContentCache: Send + Sync {
    /// Is the backing resource for `uri` present and valid?
    fn is_valid_path(&self, uri: &str) -> bool;

    /// Is the item currently excluded after recent failures?
    fn is_blacklisted(&self, item_id: &str) -> bool;

    /// Record a temporary failure so the item is skipped for `ttl_secs`
    fn add_temporary_failure(
        &self,
        kind: FailureKind,
        layout_id: i64,
        item_id: &str,
        reason: &str,
        ttl_secs: u64,
    );
}

/// Cache that accepts everything and blacklists nothing
///
/// Useful for hosts without a content cache and for tests.
#[derive(Debug, Default)]
pub struct PermissiveCache;

impl ContentCache for PermissiveCache {
    fn is_valid_path(&self, _uri: &str) -> bool {
        true
    }

    fn is_blacklisted(&self, _item_id: &str) -> bool {
        false
    }

    fn add_temporary_failure(
        &self,
        _kind: FailureKind,
        _layout_id: i64,
        _item_id: &str,
        _reason: &str,
        _ttl_secs: u64,
    ) {
    }
}
