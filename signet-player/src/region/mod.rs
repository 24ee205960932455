//! Region playback scheduler
//!
//! **Responsibilities:**
//! - Walk an ordered, filterable, loopable playlist of media nodes
//! - Survive per-item construction/start failures without crashing the show
//! - Pause/interrupt/resume and idempotent teardown
//! - Open/close proof-of-play intervals around each item showing
//!
//! The scheduler runs on the host's presentation thread: every transition
//! is `&mut self`, and control returns to the host between "start item"
//! and "item elapsed". The state checks sprinkled through the transitions
//! exist to make the interleavings with Pause/Clear/layout replacement
//! safe.

mod audio;

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use signet_common::config::PlayerSettings;
use signet_common::events::{EventBus, PlayerEvent};
use signet_common::{Error, Result};

use crate::content::{ContentCache, ContentFactory, ContentItem, FailureKind, StopBehaviour};
use crate::model::{RegionConfig, RegionGeometry};
use crate::options::WorkingOptions;
use crate::stats::{ProofOfPlayTracker, StatKind};

use audio::AudioOverlay;

/// How long a construction/start failure keeps an item out of rotation
const TEMPORARY_FAILURE_TTL_SECS: u64 = 300;

/// Notifications raised by a region to its owning layout
///
/// Each fires at most once per transition.
pub trait RegionEvents: Send {
    /// The region finished a full traversal or became unplayable.
    ///
    /// Return `true` if the layout is being torn down in response; the
    /// scheduler then stops immediately instead of continuing into the
    /// next item.
    fn on_duration_elapsed(&mut self) -> bool {
        false
    }

    /// A single item completed (informational)
    fn on_media_expired(&mut self) {}
}

/// The item currently showing in this region
struct ActiveItem {
    item: Box<dyn ContentItem>,
    item_id: String,
    stats_enabled: bool,
}

/// Retrying, self-healing playlist walker for one region
pub struct RegionScheduler {
    config: RegionConfig,
    settings: Arc<PlayerSettings>,
    factory: Arc<dyn ContentFactory>,
    cache: Arc<dyn ContentCache>,
    tracker: Arc<ProofOfPlayTracker>,
    bus: Arc<EventBus>,
    events: Box<dyn RegionEvents>,

    /// Position in the playlist; -1 = not started
    current_sequence: isize,

    current: Option<ActiveItem>,
    working: Option<WorkingOptions>,
    overlay: AudioOverlay,

    is_paused: bool,
    is_pause_pending: bool,
    is_expired: bool,
    is_layout_expired: bool,

    dimensions_set: bool,
    size_reset_pending: bool,
    active_geometry: RegionGeometry,

    /// Playback position captured by the last pause, for resume
    saved_playtime: f64,
}

impl RegionScheduler {
    /// Create a scheduler for one region
    ///
    /// An empty playlist is rejected here: a region with nothing to show
    /// performs no further work.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: RegionConfig,
        settings: Arc<PlayerSettings>,
        factory: Arc<dyn ContentFactory>,
        cache: Arc<dyn ContentCache>,
        tracker: Arc<ProofOfPlayTracker>,
        bus: Arc<EventBus>,
        events: Box<dyn RegionEvents>,
    ) -> Result<Self> {
        if config.nodes.is_empty() {
            return Err(Error::Region(format!(
                "Region {}: no media nodes to display",
                config.region_id
            )));
        }

        let overlay = AudioOverlay::new(config.region_id.clone());
        let active_geometry = config.geometry;

        Ok(Self {
            config,
            settings,
            factory,
            cache,
            tracker,
            bus,
            events,
            current_sequence: -1,
            current: None,
            working: None,
            overlay,
            is_paused: false,
            is_pause_pending: false,
            is_expired: false,
            is_layout_expired: false,
            dimensions_set: false,
            size_reset_pending: false,
            active_geometry,
            saved_playtime: 0.0,
        })
    }

    /// Start this region from the top of its playlist
    pub fn start(&mut self) -> Result<()> {
        info!(region = %self.config.region_id, "Starting region");
        self.current_sequence = -1;
        self.select_and_play_next(0.0)
    }

    /// The active item signalled completion
    ///
    /// `repeat_count > 1` means the item internally advanced through
    /// multiple sub-items (e.g. multi-file audio); the sequence catches
    /// up so the next selection stays in sync.
    pub fn on_media_elapsed(&mut self, repeat_count: usize) {
        debug!(
            region = %self.config.region_id,
            repeat_count,
            "Media duration elapsed"
        );

        if repeat_count > 1 {
            self.current_sequence += (repeat_count - 1) as isize;
        }

        self.bus.emit_lossy(PlayerEvent::MediaExpired {
            region_id: self.config.region_id.clone(),
            item_id: self.current_item_id().unwrap_or_default().to_string(),
            timestamp: Utc::now(),
        });
        self.events.on_media_expired();

        // The layout is being replaced: everything will be torn down soon
        if self.is_layout_expired {
            debug!(region = %self.config.region_id, "Layout expired, not starting next");
            return;
        }

        if self.is_paused {
            debug!(region = %self.config.region_id, "Paused, not starting next");
            return;
        }

        if self.is_pause_pending {
            debug!(region = %self.config.region_id, "Pause pending, not starting next");
            return;
        }

        if let Err(e) = self.select_and_play_next(0.0) {
            error!(region = %self.config.region_id, "Unable to start next media node: {}", e);

            // The region cannot continue; let the owner replace it
            self.is_expired = true;
            if self.events.on_duration_elapsed() {
                self.is_layout_expired = true;
            }
        }
    }

    /// The active overlay audio item signalled completion
    pub fn on_audio_elapsed(&mut self, files_played: usize) {
        self.overlay.on_elapsed(files_played);
    }

    /// Request that the region stop advancing; it will be removed soon
    pub fn pause_pending(&mut self) {
        self.is_pause_pending = true;
    }

    /// Pause this region, capturing the playback position for resume
    pub fn pause(&mut self) {
        if let Some(active) = self.current.take() {
            self.saved_playtime = active.item.current_playtime();
            debug!(
                region = %self.config.region_id,
                playtime = self.saved_playtime,
                "Pausing region"
            );
            self.stop_item(active, StopBehaviour::Forced);
        }

        self.is_paused = true;
        self.is_pause_pending = false;
    }

    /// Resume this region
    ///
    /// Resuming from an interrupt advances to the next item at position
    /// 0; a single-item playlist replays its only item from the start.
    /// Resuming a normal pause replays the same item seeking to the
    /// captured position.
    pub fn resume(&mut self, is_interrupt: bool) -> Result<()> {
        let result = if is_interrupt {
            if self.config.nodes.len() <= 1 {
                self.current_sequence -= 1;
            }
            self.select_and_play_next(0.0)
        } else {
            // Dial back one step; selection advances straight onto the
            // same item
            self.current_sequence -= 1;
            self.select_and_play_next(self.saved_playtime)
        };

        self.is_paused = false;
        result
    }

    /// Tear down anything this region still holds
    ///
    /// Idempotent and infallible: teardown runs during layout
    /// destruction, where nothing can act on an error.
    pub fn clear(&mut self) {
        debug!(region = %self.config.region_id, "Clearing region");

        self.overlay.stop_all();

        if let Some(active) = self.current.take() {
            self.stop_item(active, StopBehaviour::Graceful);
        }
    }

    /// The owning layout has expired; stop advancing
    pub fn set_layout_expired(&mut self) {
        self.is_layout_expired = true;
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired
    }

    pub fn is_layout_expired(&self) -> bool {
        self.is_layout_expired
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Playlist position of the current selection (-1 = not started)
    pub fn current_sequence(&self) -> isize {
        self.current_sequence
    }

    /// Item id of the item currently showing
    pub fn current_item_id(&self) -> Option<&str> {
        self.current.as_ref().map(|active| active.item_id.as_str())
    }

    /// Working projection of the current selection
    pub fn current_options(&self) -> Option<&WorkingOptions> {
        self.working.as_ref()
    }

    /// Geometry currently applied to the region surface
    pub fn active_geometry(&self) -> RegionGeometry {
        self.active_geometry
    }

    /// Core retry loop: select, construct, start the next playable item
    ///
    /// `position` is honored only on the first attempt; a retry never
    /// tries to resume mid-item, so a resumed item that immediately fails
    /// loses its offset for this playback cycle.
    fn select_and_play_next(&mut self, mut position: f64) -> Result<()> {
        debug!(
            region = %self.config.region_id,
            sequence = self.current_sequence,
            position,
            "Starting next media node"
        );

        if !self.dimensions_set {
            self.set_dimensions(self.config.geometry);
            self.dimensions_set = true;
        }

        let mut tries = 0;
        loop {
            // Every candidate has been tried; this region cannot play
            if tries >= self.config.nodes.len() {
                return Err(self.region_unplayable("unable to set and start a media node"));
            }
            tries += 1;

            if tries > 1 {
                position = 0.0;
            }

            let previous_sequence = self.current_sequence;

            // Stop any audio belonging to the outgoing item before
            // selecting a new one
            self.overlay.stop_current();

            let selected = self.select_next_node();

            // The duration-elapsed callback may have torn the layout
            // down; the item we already hold is being destroyed with it
            if self.is_layout_expired {
                return Ok(());
            }

            let Some(working) = selected else {
                return Err(self.region_unplayable("no valid media nodes"));
            };

            // Same item selected and no looping: this single-item region
            // has played once and now goes idle
            if self.current_sequence == previous_sequence && !self.config.loop_playback {
                debug!(
                    region = %self.config.region_id,
                    "Single media item, not looping; region goes idle"
                );
                self.working = Some(working);
                return Ok(());
            }

            self.rebuild_overlay(&working);

            let mut item = match self.factory.create(&working, self.active_geometry) {
                Ok(item) => item,
                Err(e) => {
                    warn!(
                        region = %self.config.region_id,
                        kind = ?working.kind,
                        item = %working.item_id,
                        "Unable to create media item: {}",
                        e
                    );
                    self.cache.add_temporary_failure(
                        FailureKind::Construction,
                        self.config.layout_id,
                        &working.item_id,
                        &e.to_string(),
                        TEMPORARY_FAILURE_TTL_SECS,
                    );
                    continue;
                }
            };

            // Sizing policy: full-screen override, restored on the next
            // ordinary item
            if item.region_size_change_required() {
                self.set_dimensions(RegionGeometry::new(
                    0,
                    0,
                    self.config.player_width,
                    self.config.player_height,
                ));
                self.size_reset_pending = true;
            } else if self.size_reset_pending {
                self.set_dimensions(self.config.geometry);
                self.size_reset_pending = false;
            }

            if let Err(e) = item.render(position) {
                warn!(
                    region = %self.config.region_id,
                    kind = ?working.kind,
                    item = %working.item_id,
                    "Unable to start media item: {}",
                    e
                );
                self.cache.add_temporary_failure(
                    FailureKind::Start,
                    self.config.layout_id,
                    &working.item_id,
                    &e.to_string(),
                    TEMPORARY_FAILURE_TTL_SECS,
                );
                continue;
            }

            // New item is live: start its overlay from the first entry
            self.overlay.reset();
            self.overlay.start_current();

            // Retire the outgoing item and open the new interval
            if let Some(outgoing) = self.current.take() {
                self.stop_item(outgoing, StopBehaviour::Graceful);
            }

            self.tracker.open(
                StatKind::Item,
                self.config.schedule_id,
                self.config.layout_id,
                Some(&working.item_id),
            );

            self.bus.emit_lossy(PlayerEvent::MediaStarted {
                region_id: self.config.region_id.clone(),
                item_id: working.item_id.clone(),
                position_secs: position,
                timestamp: Utc::now(),
            });

            self.current = Some(ActiveItem {
                item_id: working.item_id.clone(),
                stats_enabled: working.stats_enabled,
                item,
            });
            self.working = Some(working);

            return Ok(());
        }
    }

    /// Advance circularly to the next valid media node
    ///
    /// Skips nodes that are blacklisted, outside their validity window,
    /// or (for file-backed types) missing from the content cache.
    /// Returns `None` when no node in the playlist is valid.
    fn select_next_node(&mut self) -> Option<WorkingOptions> {
        let count = self.config.nodes.len();
        let mut attempts = 0;

        while attempts < count {
            self.current_sequence += 1;

            if self.current_sequence as usize >= count {
                info!(region = %self.config.region_id, "Region expired");

                // Start from the beginning
                self.current_sequence = 0;
                self.is_expired = true;

                self.bus.emit_lossy(PlayerEvent::RegionExpired {
                    region_id: self.config.region_id.clone(),
                    timestamp: Utc::now(),
                });

                // The owner may replace the whole layout inside this
                // callback
                if self.events.on_duration_elapsed() {
                    self.is_layout_expired = true;
                }
                if self.is_layout_expired {
                    return None;
                }
            }

            let node = &self.config.nodes[self.current_sequence as usize];

            if self.cache.is_blacklisted(&node.id) {
                warn!(
                    region = %self.config.region_id,
                    item = %node.id,
                    "Media item has been blacklisted"
                );
                attempts += 1;
                continue;
            }

            let working =
                WorkingOptions::resolve(&self.config, node, self.settings.empty_media_duration());

            if !working.is_within_window(Utc::now()) {
                debug!(
                    region = %self.config.region_id,
                    item = %working.item_id,
                    "Media item outside its from/to window"
                );
                attempts += 1;
                continue;
            }

            if working.kind.is_file_backed() && !self.cache.is_valid_path(&working.uri) {
                warn!(
                    region = %self.config.region_id,
                    item = %working.item_id,
                    uri = %working.uri,
                    "Backing file not valid in the content cache"
                );
                attempts += 1;
                continue;
            }

            debug!(
                region = %self.config.region_id,
                kind = ?working.kind,
                item = %working.item_id,
                "New media node selected"
            );
            return Some(working);
        }

        None
    }

    /// Build overlay audio items for a newly selected node
    fn rebuild_overlay(&mut self, working: &WorkingOptions) {
        let mut items: Vec<Box<dyn ContentItem>> = Vec::with_capacity(working.audio.len());

        for entry in &working.audio {
            let audio_options = WorkingOptions::for_audio(working, entry);
            match self.factory.create(&audio_options, self.active_geometry) {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(
                        region = %self.config.region_id,
                        uri = %entry.uri,
                        "Unable to create overlay audio item: {}",
                        e
                    );
                }
            }
        }

        self.overlay.rebuild(items);
    }

    /// Stop an item and close its proof-of-play interval
    ///
    /// Stop errors are logged, never propagated: the interval is closed
    /// and the final teardown acknowledgement delivered regardless.
    fn stop_item(&mut self, mut active: ActiveItem, behaviour: StopBehaviour) {
        debug!(region = %self.config.region_id, item = %active.item_id, "Stopping media item");

        self.tracker.close(
            self.config.schedule_id,
            self.config.layout_id,
            Some(&active.item_id),
            active.stats_enabled,
        );

        if let Err(e) = active.item.stop(behaviour) {
            warn!(
                region = %self.config.region_id,
                item = %active.item_id,
                "Unable to stop media item: {}",
                e
            );
        }
        active.item.stopped();
    }

    fn set_dimensions(&mut self, geometry: RegionGeometry) {
        debug!(
            region = %self.config.region_id,
            width = geometry.width,
            height = geometry.height,
            left = geometry.left,
            top = geometry.top,
            "Setting region dimensions"
        );
        self.active_geometry = geometry;
    }

    fn region_unplayable(&mut self, reason: &str) -> Error {
        self.bus.emit_lossy(PlayerEvent::RegionUnplayable {
            region_id: self.config.region_id.clone(),
            timestamp: Utc::now(),
        });
        Error::Region(format!("Region {}: {}", self.config.region_id, reason))
    }
}
