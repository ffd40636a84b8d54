//! Lap counting over a distance series.
//!
//! [`SlidingWindowCounter`] sums a sliding window of distance deltas to get a
//! direction of travel and combines it with a distance threshold. Requiring
//! both the threshold crossing and a consistent direction gives a hysteresis
//! band around the threshold, so jitter around it does not flip the zone.
//!
//! ## Lifecycle
//!
//! ```text
//!            update_count (window full)
//!   UNKNOWN ──── pick_zone ────► NEAR ◄──────► FAR
//!      ▲                          │  far→near: +lap_increment
//!      └──────── on_disconnect ───┴────────────┘
//! ```
//!
//! The lap count survives disconnects; only the zone and the delta window are
//! reset.
//!
//! The disconnect snapshot covers the whole gap, from the first disconnect
//! until a zone is picked again. Further disconnects inside the gap keep it,
//! and a swimmer seen leaving past the threshold during the gap moves it from
//! `Near` to `Far`.

use std::fmt::Debug;
use std::num::NonZeroUsize;

use crate::error::{ConfigError, Parameter, require_finite};
use crate::types::{Direction, Zone};
use crate::window::SlidingWindow;
use crate::zone_transitions::{self, ZoneObservation, ZoneStep};

/// Turns a distance series into a lap count.
pub trait LapCounter: Debug {
    /// Feeds the most recent filtered distance and returns the updated lap count.
    fn update_count(&mut self, distance: f64) -> u32;

    /// Resets the zone state after a connectivity loss. The lap count is kept.
    ///
    /// Calling it again before a zone is re-established keeps the zone
    /// recorded at the first call.
    fn on_disconnect(&mut self);

    /// Current lap count. Never decreases.
    fn lap_count(&self) -> u32;

    /// Current zone.
    fn zone(&self) -> Zone;
}

/// Lap counter driven by a sliding window of distance deltas and a threshold.
#[derive(Debug, Clone)]
pub struct SlidingWindowCounter {
    threshold: f64,
    lap_increment: u32,
    lap_count: u32,
    zone: Zone,
    /// Needed both for the next delta and for the threshold comparison.
    prev_distance: f64,
    deltas: SlidingWindow<f64>,
    /// Last zone known for the current gap, `Unknown` before the first pick.
    disconnect_snapshot: Zone,
}

impl SlidingWindowCounter {
    /// Creates a counter in the `Unknown` zone with a lap count of zero.
    ///
    /// # Parameters
    /// - `threshold`: Distance separating the near and far zones.
    /// - `window_size`: Number of deltas summed to judge direction.
    /// - `lap_increment`: Count units credited per round trip.
    ///
    /// # Errors
    /// - [`ConfigError::NonFinite`] - `threshold` is NaN or infinite
    /// - [`ConfigError::ZeroSize`] - `window_size` is 0
    pub fn new(
        threshold: f64,
        window_size: usize,
        lap_increment: u32,
    ) -> Result<Self, ConfigError> {
        let threshold = require_finite(Parameter::Threshold, threshold)?;
        let capacity = NonZeroUsize::new(window_size).ok_or(ConfigError::ZeroSize {
            parameter: Parameter::LapWindowSize,
        })?;
        Ok(Self {
            threshold,
            lap_increment,
            lap_count: 0,
            zone: Zone::Unknown,
            prev_distance: 0.0,
            deltas: SlidingWindow::new(capacity),
            disconnect_snapshot: Zone::Unknown,
        })
    }

    /// Classifies the zone from the latest distance after a (re)connect.
    ///
    /// Meant to be called once the delta window has refilled while the zone
    /// is `Unknown`. When `is_reconnect` is set and the swimmer was `Far` at
    /// the disconnect but is `Near` now, one missed round trip is credited.
    ///
    /// # Returns
    /// The updated lap count.
    pub fn pick_zone(&mut self, is_reconnect: bool) -> u32 {
        let step = zone_transitions::pick_zone(
            self.disconnect_snapshot,
            self.prev_distance,
            self.threshold,
            is_reconnect,
            self.lap_increment,
        );
        self.apply(step);
        self.lap_count
    }

    /// Net direction over the delta window.
    pub fn direction(&self) -> Direction {
        Direction::from_sum(self.deltas.sum())
    }

    /// Whether the delta window holds `window_size` deltas.
    pub fn window_is_full(&self) -> bool {
        self.deltas.is_full()
    }

    /// Number of deltas currently in the window.
    pub fn window_len(&self) -> usize {
        self.deltas.len()
    }

    pub fn window_size(&self) -> usize {
        self.deltas.capacity()
    }

    /// Last distance fed to [`LapCounter::update_count`]. 0 before the first.
    pub fn previous_distance(&self) -> f64 {
        self.prev_distance
    }

    pub fn disconnect_snapshot(&self) -> Zone {
        self.disconnect_snapshot
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn lap_increment(&self) -> u32 {
        self.lap_increment
    }

    fn push_distance(&mut self, distance: f64) {
        self.deltas.push(distance - self.prev_distance);
        self.prev_distance = distance;
    }

    fn apply(&mut self, step: ZoneStep) {
        self.zone = step.zone;
        self.lap_count = self.lap_count.saturating_add(step.laps_credited);
    }
}

impl LapCounter for SlidingWindowCounter {
    fn update_count(&mut self, distance: f64) -> u32 {
        self.push_distance(distance);

        // Not enough history to judge direction yet.
        if !self.deltas.is_full() {
            return self.lap_count;
        }

        let observation = ZoneObservation {
            distance: self.prev_distance,
            direction: self.direction(),
        };
        if self.zone == Zone::Unknown {
            self.disconnect_snapshot = zone_transitions::advance_gap_snapshot(
                self.disconnect_snapshot,
                observation,
                self.threshold,
            );
            return self.lap_count;
        }

        let step = zone_transitions::step_zone(
            self.zone,
            observation,
            self.threshold,
            self.lap_increment,
        );
        self.apply(step);
        self.lap_count
    }

    fn on_disconnect(&mut self) {
        // A second drop before the re-pick belongs to the same gap.
        if self.zone != Zone::Unknown {
            self.disconnect_snapshot = self.zone;
        }
        self.deltas.clear();
        self.zone = Zone::Unknown;
    }

    fn lap_count(&self) -> u32 {
        self.lap_count
    }

    fn zone(&self) -> Zone {
        self.zone
    }
}
