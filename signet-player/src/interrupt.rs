//! Interrupt session state
//!
//! Tracks how much of the current hour has been given to interrupt
//! content against an hourly budget. One explicitly-constructed instance
//! per player session, consumed by the host's pause/resume policy to
//! decide whether an interrupt should be granted and when budgets reset.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::Result;

/// Per-session interrupt accounting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptState {
    /// Seconds of interrupt playback accrued in the current hour
    seconds_interrupted_this_hour: u32,

    /// Target seconds of interrupt playback per hour
    target_hourly_interruption: u32,

    /// When an interrupt last preempted normal playback
    last_interruption: DateTime<Utc>,

    /// When interrupt playtime was last accrued
    last_playtime_update: DateTime<Utc>,

    /// When the interrupt schedule last changed
    last_interrupt_schedule_change: DateTime<Utc>,

    /// Seconds of interrupt playback per hour-of-day bucket (0-23)
    interrupt_tracking: HashMap<u32, u32>,
}

impl InterruptState {
    pub fn new(target_hourly_interruption: u32) -> Self {
        let now = Utc::now();
        Self {
            seconds_interrupted_this_hour: 0,
            target_hourly_interruption,
            last_interruption: now,
            last_playtime_update: now,
            last_interrupt_schedule_change: now,
            interrupt_tracking: HashMap::new(),
        }
    }

    /// Change the hourly target (schedule change)
    pub fn set_target(&mut self, target_secs: u32) {
        if target_secs != self.target_hourly_interruption {
            debug!(
                old = self.target_hourly_interruption,
                new = target_secs,
                "Interrupt target changed"
            );
            self.target_hourly_interruption = target_secs;
            self.last_interrupt_schedule_change = Utc::now();
        }
    }

    pub fn target(&self) -> u32 {
        self.target_hourly_interruption
    }

    /// Record that an interrupt preempted normal playback
    pub fn mark_interrupted(&mut self) {
        self.last_interruption = Utc::now();
    }

    /// Accrue interrupt playtime
    pub fn record_playtime(&mut self, seconds: u32) {
        self.record_playtime_at(seconds, Utc::now());
    }

    fn record_playtime_at(&mut self, seconds: u32, now: DateTime<Utc>) {
        if !same_hour(self.last_playtime_update, now) {
            // New hour: the hourly budget starts fresh
            self.seconds_interrupted_this_hour = 0;
        }

        self.seconds_interrupted_this_hour += seconds;
        *self.interrupt_tracking.entry(now.hour()).or_insert(0) += seconds;
        self.last_playtime_update = now;
    }

    /// Has the hourly target been met?
    pub fn is_satisfied(&self) -> bool {
        self.is_satisfied_at(Utc::now())
    }

    fn is_satisfied_at(&self, now: DateTime<Utc>) -> bool {
        self.seconds_this_hour(now) >= self.target_hourly_interruption
    }

    /// Should an interrupt be granted right now?
    pub fn should_interrupt(&self) -> bool {
        self.should_interrupt_at(Utc::now())
    }

    fn should_interrupt_at(&self, now: DateTime<Utc>) -> bool {
        self.target_hourly_interruption > 0 && !self.is_satisfied_at(now)
    }

    /// Seconds still owed to interrupt content this hour
    pub fn seconds_remaining(&self) -> u32 {
        self.target_hourly_interruption
            .saturating_sub(self.seconds_this_hour(Utc::now()))
    }

    fn seconds_this_hour(&self, now: DateTime<Utc>) -> u32 {
        if same_hour(self.last_playtime_update, now) {
            self.seconds_interrupted_this_hour
        } else {
            0
        }
    }

    /// Accrued seconds for an hour-of-day bucket
    pub fn tracked_for_hour(&self, hour: u32) -> u32 {
        self.interrupt_tracking.get(&hour).copied().unwrap_or(0)
    }

    /// Serialize for persistence across player restarts
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a persisted snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn same_hour(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.ordinal() == b.ordinal() && a.year() == b.year() && a.hour() == b.hour()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_accrual_within_hour() {
        let mut state = InterruptState::new(300);
        state.record_playtime_at(120, at(10, 5));
        state.record_playtime_at(60, at(10, 20));

        assert!(!state.is_satisfied_at(at(10, 30)));
        assert!(state.should_interrupt_at(at(10, 30)));
        assert_eq!(state.seconds_this_hour(at(10, 30)), 180);
        assert_eq!(state.tracked_for_hour(10), 180);
    }

    #[test]
    fn test_target_met_stops_interrupting() {
        let mut state = InterruptState::new(300);
        state.record_playtime_at(300, at(10, 5));
        assert!(state.is_satisfied_at(at(10, 30)));
        assert!(!state.should_interrupt_at(at(10, 30)));
    }

    #[test]
    fn test_budget_resets_on_hour_rollover() {
        let mut state = InterruptState::new(300);
        state.record_playtime_at(300, at(10, 50));
        assert!(state.is_satisfied_at(at(10, 55)));

        // New hour, fresh budget
        assert!(!state.is_satisfied_at(at(11, 0)));
        assert!(state.should_interrupt_at(at(11, 0)));

        state.record_playtime_at(30, at(11, 1));
        assert_eq!(state.seconds_this_hour(at(11, 2)), 30);
        // Hour-of-day buckets keep accumulating independently
        assert_eq!(state.tracked_for_hour(10), 300);
        assert_eq!(state.tracked_for_hour(11), 30);
    }

    #[test]
    fn test_zero_target_never_interrupts() {
        let state = InterruptState::new(0);
        assert!(!state.should_interrupt_at(at(10, 0)));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut state = InterruptState::new(300);
        state.record_playtime_at(120, at(10, 5));

        let json = state.to_json().unwrap();
        let restored = InterruptState::from_json(&json).unwrap();
        assert_eq!(restored.target(), 300);
        assert_eq!(restored.tracked_for_hour(10), 120);
    }
}
