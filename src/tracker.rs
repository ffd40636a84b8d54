//! The distance-tracking session.
//!
//! [`DistanceTracker`] is the single entry point a host drives. It accepts one
//! raw RSSI sample or one connectivity event per call and runs it through
//!
//! ```text
//! raw RSSI ─► MovingAverage ─► LogarithmicModel ─► SlidingWindowCounter ─► {lap count, zone}
//! ```
//!
//! It also owns the bookkeeping around disconnects that the individual
//! components leave to their caller: clearing the filter, telling the lap
//! counter exactly once per disconnect, noticing a stuck link early, and
//! picking a fresh zone once enough samples have arrived after a reconnect.
//!
//! Calls must be serialized by the host; the tracker does no locking and no I/O.

use std::time::Duration;

use serde::Serialize;

use crate::config::TrackerConfig;
use crate::constants::NULL_RSSI;
use crate::disconnect::DisconnectDetector;
use crate::distance::{DistanceEstimator, LogarithmicModel};
use crate::error::ConfigError;
use crate::filter::{LowPassFilter, MovingAverage};
use crate::lap_counter::{LapCounter, SlidingWindowCounter};
use crate::types::{LapMetric, Zone};

/// State of the radio link as seen by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkState {
    /// No connection has been made yet.
    Idle,
    Connected,
    /// The disconnect detector fired; the radio layer is still replaying
    /// `stuck_rssi` and has not sent its disconnect notification.
    Stalled { stuck_rssi: i32 },
    Disconnected,
}

/// Result of a `connected` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// First connection of the session.
    First,
    /// Connection number `n` (n >= 2) of the session.
    Reconnect(u32),
    /// The tracker already considered the link connected; nothing changed.
    AlreadyConnected,
}

/// Why a sample did not reach the lap counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The radio layer reported its null value.
    NullReading,
    /// No live connection.
    NotConnected,
    /// Cached reading replayed by a stalled link.
    StaleReading,
}

/// Outputs after one processed sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub rssi: i32,
    pub filtered_rssi: f64,
    pub distance: f64,
    pub lap_count: u32,
    pub zone: Zone,
}

/// Result of [`DistanceTracker::push_sample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    Processed(Reading),
    /// The sample completed a run of identical readings; the tracker has
    /// torn down the session state as for a disconnect.
    LinkStalled { stuck_rssi: i32 },
    Ignored(IgnoreReason),
}

/// Point-in-time view of the tracker outputs, for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackerSnapshot {
    pub filtered_rssi: f64,
    pub distance: f64,
    pub lap_count: u32,
    pub zone: Zone,
    pub link: LinkState,
    pub connection_count: u32,
}

/// One beacon-tracking session.
#[derive(Debug)]
pub struct DistanceTracker {
    filter: MovingAverage,
    model: LogarithmicModel,
    detector: DisconnectDetector,
    counter: SlidingWindowCounter,
    lap_metric: LapMetric,
    poll_interval: Duration,
    fast_poll_interval: Duration,
    link: LinkState,
    connection_count: u32,
    /// Latest estimated distance; kept across disconnects for display.
    distance: f64,
}

impl DistanceTracker {
    /// Builds every pipeline stage from `config`.
    ///
    /// # Errors
    /// Any [`ConfigError`] reported by [`TrackerConfig::validate`].
    pub fn new(config: &TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            filter: MovingAverage::new(config.filter_window_size)?,
            model: LogarithmicModel::new(config.offset, config.scale)?,
            detector: DisconnectDetector::new(config.disconnect_repeat_count)?,
            counter: SlidingWindowCounter::new(
                config.threshold,
                config.lap_window_size,
                config.lap_increment,
            )?,
            lap_metric: config.lap_metric,
            poll_interval: config.poll_interval,
            fast_poll_interval: config.fast_poll_interval,
            link: LinkState::Idle,
            connection_count: 0,
            distance: 0.0,
        })
    }

    /// Handles a `connected` notification from the radio layer.
    pub fn on_connected(&mut self) -> ConnectionKind {
        if self.link == LinkState::Connected {
            return ConnectionKind::AlreadyConnected;
        }
        self.mark_connected()
    }

    /// Handles a `disconnected` notification from the radio layer.
    ///
    /// When the link was already torn down by the disconnect detector this
    /// only records the notification, so the lap counter sees one disconnect
    /// per gap.
    pub fn on_disconnected(&mut self) {
        match self.link {
            LinkState::Connected => {
                self.tear_down();
                self.link = LinkState::Disconnected;
            }
            LinkState::Stalled { .. } => self.link = LinkState::Disconnected,
            LinkState::Idle | LinkState::Disconnected => {}
        }
    }

    /// Feeds one raw RSSI reading.
    pub fn push_sample(&mut self, rssi: i32) -> SampleOutcome {
        if rssi == NULL_RSSI {
            return SampleOutcome::Ignored(IgnoreReason::NullReading);
        }

        match self.link {
            LinkState::Connected => {}
            LinkState::Stalled { stuck_rssi } if rssi == stuck_rssi => {
                return SampleOutcome::Ignored(IgnoreReason::StaleReading);
            }
            // A fresh value after a stall means the link recovered without a
            // formal disconnect.
            LinkState::Stalled { .. } => {
                self.mark_connected();
            }
            LinkState::Idle | LinkState::Disconnected => {
                return SampleOutcome::Ignored(IgnoreReason::NotConnected);
            }
        }

        if self.detector.should_disconnect(rssi) {
            self.tear_down();
            self.link = LinkState::Stalled { stuck_rssi: rssi };
            return SampleOutcome::LinkStalled { stuck_rssi: rssi };
        }

        SampleOutcome::Processed(self.process(rssi))
    }

    fn process(&mut self, rssi: i32) -> Reading {
        let filtered_rssi = self.filter.filter(f64::from(rssi));
        self.distance = self.model.distance(filtered_rssi);

        let metric = match self.lap_metric {
            LapMetric::Distance => self.distance,
            LapMetric::SignalMagnitude => filtered_rssi.abs(),
        };
        self.counter.update_count(metric);

        if self.counter.zone() == Zone::Unknown
            && self.counter.window_is_full()
            && self.filter.is_full()
        {
            self.counter.pick_zone(self.connection_count > 1);
        }

        Reading {
            rssi,
            filtered_rssi,
            distance: self.distance,
            lap_count: self.counter.lap_count(),
            zone: self.counter.zone(),
        }
    }

    fn mark_connected(&mut self) -> ConnectionKind {
        self.link = LinkState::Connected;
        self.connection_count = self.connection_count.saturating_add(1);
        self.detector.reset();
        if self.connection_count > 1 {
            ConnectionKind::Reconnect(self.connection_count)
        } else {
            ConnectionKind::First
        }
    }

    fn tear_down(&mut self) {
        self.filter.clear();
        self.counter.on_disconnect();
        self.detector.reset();
    }

    /// Current filtered RSSI; 0 right after a disconnect.
    pub fn filtered_rssi(&self) -> f64 {
        self.filter.value()
    }

    /// Most recent distance estimate.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn lap_count(&self) -> u32 {
        self.counter.lap_count()
    }

    pub fn zone(&self) -> Zone {
        self.counter.zone()
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn is_connected(&self) -> bool {
        self.link == LinkState::Connected
    }

    /// Number of connections made this session, implicit recoveries included.
    pub fn connection_count(&self) -> u32 {
        self.connection_count
    }

    /// Suggested RSSI polling period: faster while the zone is unknown so the
    /// windows refill sooner.
    pub fn poll_interval(&self) -> Duration {
        if self.zone() == Zone::Unknown {
            self.fast_poll_interval
        } else {
            self.poll_interval
        }
    }

    /// Read access to the lap counter, e.g. for diagnostics.
    pub fn counter(&self) -> &SlidingWindowCounter {
        &self.counter
    }

    pub fn model(&self) -> &LogarithmicModel {
        &self.model
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            filtered_rssi: self.filtered_rssi(),
            distance: self.distance,
            lap_count: self.lap_count(),
            zone: self.zone(),
            link: self.link,
            connection_count: self.connection_count,
        }
    }
}
