//! Shared test doubles for the scheduler integration tests
//!
//! A scripted content factory builds fake items whose lifecycle calls are
//! recorded into a journal the test can inspect.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use signet_common::config::PlayerSettings;
use signet_common::events::EventBus;
use signet_common::{Error, Result};
use signet_player::content::{
    ContentCache, ContentFactory, ContentItem, FailureKind, StopBehaviour,
};
use signet_player::model::{
    MediaKind, MediaNodeDescriptor, RegionConfig, RegionGeometry,
};
use signet_player::options::WorkingOptions;
use signet_player::region::{RegionEvents, RegionScheduler};
use signet_player::stats::{ProofOfPlayTracker, Stat};

/// One observable lifecycle action performed by a fake item
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Created { id: String },
    Rendered { id: String, position: f64 },
    Stopped { id: String, forced: bool },
    TornDown { id: String },
}

/// Ordered record of everything the fakes did
#[derive(Default)]
pub struct Journal(Mutex<Vec<Action>>);

impl Journal {
    pub fn push(&self, action: Action) {
        self.0.lock().unwrap().push(action);
    }

    pub fn actions(&self) -> Vec<Action> {
        self.0.lock().unwrap().clone()
    }

    /// Item ids in creation order
    pub fn created_ids(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Created { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    /// (item id, position) pairs in render order
    pub fn rendered(&self) -> Vec<(String, f64)> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Rendered { id, position } => Some((id, position)),
                _ => None,
            })
            .collect()
    }

    pub fn stops_for(&self, id: &str) -> Vec<bool> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Stopped { id: stopped, forced } if stopped == id => Some(forced),
                _ => None,
            })
            .collect()
    }
}

struct FakeItem {
    id: String,
    journal: Arc<Journal>,
    playtime: f64,
    fail_render: bool,
    fullscreen: bool,
}

impl ContentItem for FakeItem {
    fn item_id(&self) -> &str {
        &self.id
    }

    fn render(&mut self, position_secs: f64) -> Result<()> {
        if self.fail_render {
            return Err(Error::Media(format!("{}: scripted render failure", self.id)));
        }
        self.journal.push(Action::Rendered {
            id: self.id.clone(),
            position: position_secs,
        });
        Ok(())
    }

    fn current_playtime(&self) -> f64 {
        self.playtime
    }

    fn stop(&mut self, behaviour: StopBehaviour) -> Result<()> {
        self.journal.push(Action::Stopped {
            id: self.id.clone(),
            forced: behaviour == StopBehaviour::Forced,
        });
        Ok(())
    }

    fn stopped(&mut self) {
        self.journal.push(Action::TornDown { id: self.id.clone() });
    }

    fn region_size_change_required(&self) -> bool {
        self.fullscreen
    }
}

/// Factory producing journal-recording fakes, with per-item failure
/// scripting
#[derive(Default)]
pub struct ScriptedFactory {
    pub journal: Arc<Journal>,
    fail_create: Mutex<HashSet<String>>,
    fail_render: Mutex<HashSet<String>>,
    playtimes: Mutex<HashMap<String, f64>>,
    fullscreen: Mutex<HashSet<String>>,
}

impl ScriptedFactory {
    pub fn fail_creation_of(&self, id: &str) {
        self.fail_create.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_render_of(&self, id: &str) {
        self.fail_render.lock().unwrap().insert(id.to_string());
    }

    pub fn set_playtime(&self, id: &str, playtime: f64) {
        self.playtimes.lock().unwrap().insert(id.to_string(), playtime);
    }

    pub fn set_fullscreen(&self, id: &str) {
        self.fullscreen.lock().unwrap().insert(id.to_string());
    }

    /// Overlay audio items are journalled under their uri; everything
    /// else under its playlist item id
    fn fake_id(options: &WorkingOptions) -> String {
        if options.kind == MediaKind::Audio && !options.uri.is_empty() {
            options.uri.clone()
        } else {
            options.item_id.clone()
        }
    }
}

impl ContentFactory for ScriptedFactory {
    fn create(
        &self,
        options: &WorkingOptions,
        _geometry: RegionGeometry,
    ) -> Result<Box<dyn ContentItem>> {
        let id = Self::fake_id(options);

        if self.fail_create.lock().unwrap().contains(&id) {
            return Err(Error::Media(format!("{}: scripted construction failure", id)));
        }

        self.journal.push(Action::Created { id: id.clone() });

        Ok(Box::new(FakeItem {
            playtime: self.playtimes.lock().unwrap().get(&id).copied().unwrap_or(0.0),
            fail_render: self.fail_render.lock().unwrap().contains(&id),
            fullscreen: self.fullscreen.lock().unwrap().contains(&id),
            id,
            journal: Arc::clone(&self.journal),
        }))
    }
}

/// Cache double with scriptable blacklist/validity and a failure log
#[derive(Default)]
pub struct TestCache {
    blacklisted: Mutex<HashSet<String>>,
    invalid_uris: Mutex<HashSet<String>>,
    pub blacklist_queries: AtomicUsize,
    pub failures: Mutex<Vec<(FailureKind, String, String)>>,
}

impl TestCache {
    pub fn blacklist(&self, item_id: &str) {
        self.blacklisted.lock().unwrap().insert(item_id.to_string());
    }

    pub fn invalidate_uri(&self, uri: &str) {
        self.invalid_uris.lock().unwrap().insert(uri.to_string());
    }

    pub fn recorded_failures(&self) -> Vec<(FailureKind, String, String)> {
        self.failures.lock().unwrap().clone()
    }
}

impl ContentCache for TestCache {
    fn is_valid_path(&self, uri: &str) -> bool {
        !self.invalid_uris.lock().unwrap().contains(uri)
    }

    fn is_blacklisted(&self, item_id: &str) -> bool {
        self.blacklist_queries.fetch_add(1, Ordering::SeqCst);
        self.blacklisted.lock().unwrap().contains(item_id)
    }

    fn add_temporary_failure(
        &self,
        kind: FailureKind,
        _layout_id: i64,
        item_id: &str,
        reason: &str,
        _ttl_secs: u64,
    ) {
        self.failures
            .lock()
            .unwrap()
            .push((kind, item_id.to_string(), reason.to_string()));
    }
}

/// Counters shared between the test and its RegionEvents handle
#[derive(Default)]
pub struct EventCounters {
    pub duration_elapsed: AtomicUsize,
    pub media_expired: AtomicUsize,
}

pub struct RecordingEvents {
    pub counters: Arc<EventCounters>,

    /// Scripted return value of `on_duration_elapsed`: the layout tears
    /// itself down inside the callback
    pub teardown_on_duration_elapsed: bool,
}

impl RegionEvents for RecordingEvents {
    fn on_duration_elapsed(&mut self) -> bool {
        self.counters.duration_elapsed.fetch_add(1, Ordering::SeqCst);
        self.teardown_on_duration_elapsed
    }

    fn on_media_expired(&mut self) {
        self.counters.media_expired.fetch_add(1, Ordering::SeqCst);
    }
}

/// A scheduler wired to scripted collaborators
pub struct Harness {
    pub scheduler: RegionScheduler,
    pub journal: Arc<Journal>,
    pub factory: Arc<ScriptedFactory>,
    pub cache: Arc<TestCache>,
    pub counters: Arc<EventCounters>,
    pub tracker: Arc<ProofOfPlayTracker>,
    pub stats_rx: mpsc::UnboundedReceiver<Stat>,
    pub bus: Arc<EventBus>,
}

pub fn image_node(id: &str, duration_secs: u32) -> MediaNodeDescriptor {
    let mut node = MediaNodeDescriptor::new(id, MediaKind::Image);
    node.duration_secs = Some(duration_secs);
    node.options.insert("uri".to_string(), format!("{id}.jpg"));
    node
}

pub fn region_config(nodes: Vec<MediaNodeDescriptor>, loop_playback: bool) -> RegionConfig {
    RegionConfig {
        region_id: "r1".to_string(),
        schedule_id: 7,
        layout_id: 12,
        geometry: RegionGeometry::new(10, 20, 640, 360),
        player_width: 1920,
        player_height: 1080,
        loop_playback,
        nodes,
    }
}

pub fn harness(nodes: Vec<MediaNodeDescriptor>, loop_playback: bool) -> Harness {
    harness_with(region_config(nodes, loop_playback), false)
}

pub fn harness_with(config: RegionConfig, teardown_on_duration_elapsed: bool) -> Harness {
    let factory = Arc::new(ScriptedFactory::default());
    let journal = Arc::clone(&factory.journal);
    let cache = Arc::new(TestCache::default());
    let counters = Arc::new(EventCounters::default());
    let (tracker, stats_rx) = ProofOfPlayTracker::new(true);
    let bus = Arc::new(EventBus::new(100));

    let scheduler = RegionScheduler::new(
        config,
        Arc::new(PlayerSettings::default()),
        Arc::clone(&factory) as Arc<dyn ContentFactory>,
        Arc::clone(&cache) as Arc<dyn ContentCache>,
        Arc::clone(&tracker),
        Arc::clone(&bus),
        Box::new(RecordingEvents {
            counters: Arc::clone(&counters),
            teardown_on_duration_elapsed,
        }),
    )
    .expect("scheduler construction");

    Harness {
        scheduler,
        journal,
        factory,
        cache,
        counters,
        tracker,
        stats_rx,
        bus,
    }
}
