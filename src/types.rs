//! Core value types shared across the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of the swimmer relative to the distance threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    /// Within the threshold of the beacon.
    Near,
    /// Beyond the threshold.
    Far,
    /// No valid classification yet: initial state and after every disconnect.
    #[default]
    Unknown,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Near => "NEAR",
            Zone::Far => "FAR",
            Zone::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Net direction of travel over the delta window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Distance shrinking (toward the beacon).
    Inward,
    /// No net movement. Carries no information for zone transitions.
    Steady,
    /// Distance growing (away from the beacon).
    Outward,
}

impl Direction {
    /// Sign of a summed delta window. NaN and zero are both `Steady`.
    pub fn from_sum(sum: f64) -> Self {
        if sum > 0.0 {
            Direction::Outward
        } else if sum < 0.0 {
            Direction::Inward
        } else {
            Direction::Steady
        }
    }
}

/// Quantity fed into the lap counter and compared with the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LapMetric {
    /// Estimated distance from the calibrated model.
    #[default]
    Distance,
    /// Magnitude of the filtered RSSI in dBm. Grows with distance like the
    /// estimate does, and needs no model calibration.
    SignalMagnitude,
}
