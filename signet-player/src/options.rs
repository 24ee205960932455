//! Working options for the currently selected media node
//!
//! A fresh `WorkingOptions` value is constructed for every selection
//! cycle from the immutable descriptor, so stale values from a previous
//! item can never leak into the next one.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::model::{AudioNodeDescriptor, MediaKind, MediaNodeDescriptor, OptionMap, RegionConfig};

/// Duration applied when a node's declared duration is missing or
/// unparseable (seconds).
pub const DEFAULT_DURATION_SECS: u32 = 60;

/// Default update interval for types that routinely refresh (minutes).
pub const DEFAULT_UPDATE_INTERVAL: u32 = 5;

/// Update interval applied when the option is present but not an integer
/// (minutes).
pub const UNPARSEABLE_UPDATE_INTERVAL: u32 = 3600;

/// Update interval for text/webpage content without one of its own:
/// effectively "never", so a missing value does not force premature
/// refresh (minutes).
pub const STATIC_UPDATE_INTERVAL: u32 = u32::MAX;

/// Working projection of the currently selected media node
///
/// Built once per selection; read-only while the item is active.
#[derive(Debug, Clone)]
pub struct WorkingOptions {
    pub region_id: String,
    pub schedule_id: i64,
    pub layout_id: i64,
    pub item_id: String,
    pub kind: MediaKind,
    pub render: Option<String>,

    /// Resolved duration in seconds (0 = play to natural end)
    pub duration_secs: u32,

    /// Resolved content refresh interval (minutes)
    pub update_interval: u32,

    /// Content uri, unresolved against the library folder
    pub uri: String,

    /// Validity window start (inclusive)
    pub from_dt: DateTime<Utc>,

    /// Validity window end (exclusive)
    pub to_dt: DateTime<Utc>,

    pub stats_enabled: bool,
    pub options: OptionMap,
    pub raw: OptionMap,
    pub audio: Vec<AudioOptions>,
}

/// Resolved options for one audio overlay entry
#[derive(Debug, Clone)]
pub struct AudioOptions {
    pub uri: String,
    pub looped: bool,
    pub volume: u32,

    /// Resolved duration in seconds (0 = play to natural end)
    pub duration_secs: u32,
}

impl WorkingOptions {
    /// Build working options for a playlist node
    ///
    /// `empty_media_fallback_secs` replaces a declared zero duration on
    /// types that cannot play to a natural end.
    pub fn resolve(
        config: &RegionConfig,
        node: &MediaNodeDescriptor,
        empty_media_fallback_secs: u32,
    ) -> Self {
        let duration_secs = resolve_duration(node, empty_media_fallback_secs);
        let update_interval = resolve_update_interval(node);

        let audio = node
            .audio
            .iter()
            .map(|entry| resolve_audio(entry, node.kind, duration_secs))
            .collect();

        Self {
            region_id: config.region_id.clone(),
            schedule_id: config.schedule_id,
            layout_id: config.layout_id,
            item_id: node.id.clone(),
            kind: node.kind,
            render: node.render.clone(),
            duration_secs,
            update_interval,
            uri: node.options.get("uri").cloned().unwrap_or_default(),
            from_dt: node.from_dt.unwrap_or(DateTime::<Utc>::MIN_UTC),
            to_dt: node.to_dt.unwrap_or(DateTime::<Utc>::MAX_UTC),
            stats_enabled: node.stats_enabled,
            options: node.options.clone(),
            raw: node.raw.clone(),
            audio,
        }
    }

    /// Working options for one overlay audio item, derived from its parent
    pub fn for_audio(parent: &WorkingOptions, audio: &AudioOptions) -> Self {
        let mut options = OptionMap::new();
        if audio.looped {
            options.insert("loop".to_string(), "1".to_string());
        }
        options.insert("volume".to_string(), audio.volume.to_string());

        Self {
            region_id: parent.region_id.clone(),
            schedule_id: parent.schedule_id,
            layout_id: parent.layout_id,
            item_id: parent.item_id.clone(),
            kind: MediaKind::Audio,
            render: None,
            duration_secs: audio.duration_secs,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            uri: audio.uri.clone(),
            from_dt: DateTime::<Utc>::MIN_UTC,
            to_dt: DateTime::<Utc>::MAX_UTC,
            stats_enabled: false,
            options,
            raw: OptionMap::new(),
            audio: Vec::new(),
        }
    }

    /// Is the item inside its validity window at `now`?
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.from_dt <= now && self.to_dt > now
    }
}

fn resolve_duration(node: &MediaNodeDescriptor, empty_media_fallback_secs: u32) -> u32 {
    let declared = match node.duration_secs {
        Some(secs) => secs,
        None => {
            warn!(item = %node.id, "Duration is missing, using a default of {}", DEFAULT_DURATION_SECS);
            DEFAULT_DURATION_SECS
        }
    };

    // A zero duration only makes sense for content with a natural end
    if declared == 0 && !node.kind.is_natural_length() {
        empty_media_fallback_secs
    } else {
        declared
    }
}

fn resolve_update_interval(node: &MediaNodeDescriptor) -> u32 {
    match node.options.get("updateInterval") {
        Some(text) => match text.parse::<u32>() {
            Ok(interval) => interval,
            Err(_) => {
                warn!(item = %node.id, "Non-integer updateInterval '{}', assuming a high value", text);
                UNPARSEABLE_UPDATE_INTERVAL
            }
        },
        None if node.kind.prefers_static_refresh() => STATIC_UPDATE_INTERVAL,
        None => DEFAULT_UPDATE_INTERVAL,
    }
}

fn resolve_audio(entry: &AudioNodeDescriptor, parent_kind: MediaKind, parent_duration: u32) -> AudioOptions {
    let duration_secs = match entry.duration_secs {
        Some(secs) => secs,
        // A looping overlay inherits the parent item's duration; an
        // unbounded parent makes the overlay unbounded too.
        None if entry.looped => {
            if parent_kind.is_natural_length() && parent_duration == 0 {
                u32::MAX
            } else {
                parent_duration
            }
        }
        None => 0,
    };

    AudioOptions {
        uri: entry.uri.clone(),
        looped: entry.looped,
        volume: entry.volume,
        duration_secs,
    }
}
