//! Player settings loading and library folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default duration applied when a node declares a zero duration but its
/// type cannot play to a natural end (seconds).
pub const DEFAULT_EMPTY_MEDIA_DURATION_SECS: u32 = 10;

const STAT_DATABASE_FILENAME: &str = "pop.db";

/// Process-wide player settings
///
/// Owned by the host and shared into the player core by reference; the
/// core never mutates settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Folder holding downloaded content and the stat database
    pub library_path: PathBuf,

    /// Global proof-of-play toggle, consulted when a stat interval closes
    pub stats_enabled: bool,

    /// Fallback duration for zero-duration, non-natural-length media
    /// (seconds); 0 means "use the compiled default"
    pub empty_media_duration_secs: u32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
            stats_enabled: true,
            empty_media_duration_secs: DEFAULT_EMPTY_MEDIA_DURATION_SECS,
        }
    }
}

impl PlayerSettings {
    /// Load settings following the priority order:
    /// 1. Explicit path argument (highest priority)
    /// 2. SIGNET_CONFIG environment variable
    /// 3. Platform config directory (`<config_dir>/signet/config.toml`)
    /// 4. Compiled defaults (fallback)
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load_from_file(path);
        }

        if let Ok(path) = std::env::var("SIGNET_CONFIG") {
            return Self::load_from_file(Path::new(&path));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("signet").join("config.toml");
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        info!("No config file found, using default settings");
        Ok(Self::default())
    }

    /// Load settings from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings: PlayerSettings = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Path of the proof-of-play database inside the library folder
    pub fn stat_db_path(&self) -> PathBuf {
        self.library_path.join(STAT_DATABASE_FILENAME)
    }

    /// Effective fallback duration for zero-duration media (seconds)
    pub fn empty_media_duration(&self) -> u32 {
        if self.empty_media_duration_secs == 0 {
            DEFAULT_EMPTY_MEDIA_DURATION_SECS
        } else {
            self.empty_media_duration_secs
        }
    }
}

/// OS-dependent default library folder
fn default_library_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("signet"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/signet"))
}
