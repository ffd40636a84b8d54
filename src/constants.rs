//! Default tuning values for the lap counting pipeline.
//!
//! These are the values the tracker falls back to when a [`TrackerConfig`]
//! does not override them. Calibration values come from a regression of RSSI
//! against known distances for one beacon model and should be replaced by a
//! fresh calibration for other hardware.
//!
//! [`TrackerConfig`]: crate::config::TrackerConfig

use std::time::Duration;

// --- Signal model ---

/// Calibrated RSSI at a distance of 1 unit, in dBm.
pub const DEFAULT_MODEL_OFFSET: f64 = -64.1;
/// Calibrated RSSI slope per natural-log unit of distance.
pub const DEFAULT_MODEL_SCALE: f64 = -7.47;

/// RSSI value the radio layer reports when it has no reading. Never a real measurement.
pub const NULL_RSSI: i32 = 0;

// --- Window sizes ---

/// Number of raw RSSI samples averaged by the low-pass filter.
pub const DEFAULT_FILTER_WINDOW_SIZE: usize = 10;
/// Number of distance deltas summed to judge the direction of travel.
pub const DEFAULT_LAP_WINDOW_SIZE: usize = 3;
/// Consecutive identical readings after which the link is considered stuck.
pub const DEFAULT_DISCONNECT_REPEAT_COUNT: u32 = 5;

// --- Lap counting ---

/// Lap count units credited per round trip (one length out, one length back).
pub const DEFAULT_LAP_INCREMENT: u32 = 2;
/// Distance separating the near and far zones, in model distance units.
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 3.0;

// --- Sampling cadence hints ---

/// RSSI poll period once a zone has been established.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// RSSI poll period while the zone is unknown, to refill the windows quickly.
pub const DEFAULT_FAST_POLL_INTERVAL: Duration = Duration::from_millis(250);
