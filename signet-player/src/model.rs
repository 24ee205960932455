//! Data model for region playback
//!
//! Descriptors are the immutable, parsed-once view of a layout's playlist.
//! The scheduler never mutates them; per-selection working state lives in
//! [`crate::options::WorkingOptions`].

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered option mapping attached to a media node (keys unique)
pub type OptionMap = IndexMap<String, String>;

/// Media node type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    LocalVideo,
    Audio,
    Webpage,
    Text,
    Ticker,
    DatasetView,
    Embedded,
    ShellCommand,
    HtmlPackage,
    Spacer,
    Flash,
    PowerPoint,
    Hls,
}

impl MediaKind {
    /// File-backed types are checked against the content cache before
    /// selection.
    pub fn is_file_backed(self) -> bool {
        matches!(
            self,
            MediaKind::Image
                | MediaKind::Video
                | MediaKind::Audio
                | MediaKind::Flash
                | MediaKind::PowerPoint
                | MediaKind::HtmlPackage
        )
    }

    /// Types that may legitimately declare a zero duration, meaning "play
    /// to the natural end of the content".
    pub fn is_natural_length(self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::LocalVideo)
    }

    /// Interactive/text types get a very large default update interval so
    /// a missing value does not force premature refresh.
    pub fn prefers_static_refresh(self) -> bool {
        matches!(self, MediaKind::Webpage | MediaKind::Text)
    }
}

/// Audio overlay entry nested under a media node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioNodeDescriptor {
    /// Audio file uri, relative to the library folder
    pub uri: String,

    /// Restart the file when it finishes
    pub looped: bool,

    /// Playback volume, 0-100
    pub volume: u32,

    /// Declared duration in seconds; `None` inherits from the parent item
    /// when looped, otherwise plays to the natural end
    pub duration_secs: Option<u32>,
}

impl AudioNodeDescriptor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            looped: false,
            volume: 100,
            duration_secs: None,
        }
    }
}

/// Immutable definition of one playlist entry
///
/// Parsed once per layout load; read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaNodeDescriptor {
    /// Playlist item id
    pub id: String,

    /// Media type tag
    pub kind: MediaKind,

    /// Backing file id, where the node is file-backed
    pub file_id: Option<i64>,

    /// Declared duration in seconds. `None` = missing or unparseable,
    /// `Some(0)` = play to natural end.
    pub duration_secs: Option<u32>,

    /// Render hint ("html" routes unknown types to the web renderer)
    pub render: Option<String>,

    /// Start of the validity window (inclusive); `None` = always valid
    pub from_dt: Option<DateTime<Utc>>,

    /// End of the validity window (exclusive); `None` = never expires
    pub to_dt: Option<DateTime<Utc>>,

    /// Per-type option mapping
    pub options: OptionMap,

    /// Raw payload mapping (inline text, templates, scripts)
    pub raw: OptionMap,

    /// Nested audio overlay entries
    pub audio: Vec<AudioNodeDescriptor>,

    /// Whether proof-of-play is recorded for this node
    pub stats_enabled: bool,
}

impl MediaNodeDescriptor {
    /// New descriptor with an always-valid window and stats enabled
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
            file_id: None,
            duration_secs: None,
            render: None,
            from_dt: None,
            to_dt: None,
            options: OptionMap::new(),
            raw: OptionMap::new(),
            audio: Vec::new(),
            stats_enabled: true,
        }
    }
}

/// Fixed geometry of a playback region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionGeometry {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl RegionGeometry {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self { left, top, width, height }
    }
}

/// Everything the scheduler needs to drive one region
#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Region id within the layout
    pub region_id: String,

    /// Schedule the layout was selected from
    pub schedule_id: i64,

    /// Layout this region belongs to
    pub layout_id: i64,

    /// Region geometry within the player surface
    pub geometry: RegionGeometry,

    /// Full player surface width (for full-screen overrides)
    pub player_width: u32,

    /// Full player surface height (for full-screen overrides)
    pub player_height: u32,

    /// Restart the playlist after a full traversal
    pub loop_playback: bool,

    /// Ordered playlist
    pub nodes: Vec<MediaNodeDescriptor>,
}
