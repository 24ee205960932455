//! Audio overlay sequencer
//!
//! A secondary, nested sequence of audio items attached to the currently
//! playing primary item, advanced independently on its own elapsed
//! signal. Rebuilt from scratch every time a new primary node is
//! selected; old items are force-stopped first so no completion routing
//! outlives its item.

use tracing::warn;

use crate::content::{ContentItem, StopBehaviour};

pub(crate) struct AudioOverlay {
    region_id: String,
    items: Vec<Box<dyn ContentItem>>,

    /// 1-based cursor into `items`
    sequence: usize,
}

impl AudioOverlay {
    pub(crate) fn new(region_id: String) -> Self {
        Self {
            region_id,
            items: Vec::new(),
            sequence: 1,
        }
    }

    /// Replace the overlay with the items for a newly selected node
    pub(crate) fn rebuild(&mut self, items: Vec<Box<dyn ContentItem>>) {
        self.stop_all();
        self.items = items;
        self.sequence = 1;
    }

    /// Rewind the cursor to the first entry
    pub(crate) fn reset(&mut self) {
        self.sequence = 1;
    }

    /// Start the item under the cursor
    ///
    /// A cursor past the end means there are fewer audio items than
    /// elapsed signals suggested; the overlay is silently finished.
    pub(crate) fn start_current(&mut self) {
        if self.sequence > self.items.len() {
            return;
        }

        let item = &mut self.items[self.sequence - 1];
        if let Err(e) = item.render(0.0) {
            warn!(region = %self.region_id, "Unable to start overlay audio: {}", e);
        }
    }

    /// An overlay item finished: stop it, advance, start the next
    pub(crate) fn on_elapsed(&mut self, files_played: usize) {
        self.stop_current();

        // A zero report still advances, otherwise the same file restarts forever
        self.sequence += files_played.max(1);

        self.start_current();
    }

    /// Stop the item under the cursor, if any
    pub(crate) fn stop_current(&mut self) {
        if self.items.is_empty() || self.sequence > self.items.len() {
            return;
        }

        let item = &mut self.items[self.sequence - 1];
        if let Err(e) = item.stop(StopBehaviour::Graceful) {
            warn!(region = %self.region_id, "Unable to stop overlay audio: {}", e);
        }
        item.stopped();
    }

    /// Force-stop and discard every overlay item
    pub(crate) fn stop_all(&mut self) {
        for mut item in self.items.drain(..) {
            if let Err(e) = item.stop(StopBehaviour::Forced) {
                warn!(region = %self.region_id, "Unable to dispose of overlay audio: {}", e);
            }
            item.stopped();
        }
        self.sequence = 1;
    }
}
