//! Per-session tracker configuration.
//!
//! Fixed for the lifetime of a [`DistanceTracker`]. Every field has a default
//! from [`crate::constants`], so a host only needs to override the
//! calibration it measured. Durations serialize as integer milliseconds.
//!
//! [`DistanceTracker`]: crate::tracker::DistanceTracker

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::constants::*;
use crate::error::{ConfigError, Parameter, require_finite};
use crate::types::LapMetric;

/// Configuration for one distance-tracking session.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// RSSI at unit distance (dBm).
    pub offset: f64,
    /// RSSI change per natural-log unit of distance. Must be nonzero.
    pub scale: f64,
    /// Near/far boundary, in the units of `lap_metric`.
    pub threshold: f64,
    /// Raw readings averaged by the low-pass filter (N).
    pub filter_window_size: usize,
    /// Distance deltas summed to judge direction (W).
    pub lap_window_size: usize,
    /// Identical consecutive readings that mark the link as stuck (K).
    pub disconnect_repeat_count: u32,
    /// Count units credited per round trip.
    pub lap_increment: u32,
    /// Quantity compared against `threshold`.
    pub lap_metric: LapMetric,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub poll_interval: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub fast_poll_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            offset: DEFAULT_MODEL_OFFSET,
            scale: DEFAULT_MODEL_SCALE,
            threshold: DEFAULT_DISTANCE_THRESHOLD,
            filter_window_size: DEFAULT_FILTER_WINDOW_SIZE,
            lap_window_size: DEFAULT_LAP_WINDOW_SIZE,
            disconnect_repeat_count: DEFAULT_DISCONNECT_REPEAT_COUNT,
            lap_increment: DEFAULT_LAP_INCREMENT,
            lap_metric: LapMetric::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            fast_poll_interval: DEFAULT_FAST_POLL_INTERVAL,
        }
    }
}

impl TrackerConfig {
    /// Checks every constraint that component constructors would otherwise
    /// report one at a time.
    ///
    /// # Errors
    /// - [`ConfigError::NonFinite`] - `offset`, `scale` or `threshold` is NaN or infinite
    /// - [`ConfigError::ZeroScale`] - `scale` is zero
    /// - [`ConfigError::ZeroSize`] - a window size or the repeat count is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_finite(Parameter::Offset, self.offset)?;
        require_finite(Parameter::Scale, self.scale)?;
        require_finite(Parameter::Threshold, self.threshold)?;
        if self.scale == 0.0 {
            return Err(ConfigError::ZeroScale);
        }

        let sizes = [
            (Parameter::FilterWindowSize, self.filter_window_size),
            (Parameter::LapWindowSize, self.lap_window_size),
            (
                Parameter::DisconnectRepeatCount,
                self.disconnect_repeat_count as usize,
            ),
        ];
        if let Some((parameter, _)) = sizes.into_iter().find(|&(_, size)| size == 0) {
            return Err(ConfigError::ZeroSize { parameter });
        }
        Ok(())
    }
}
