//! Calibration helpers.
//!
//! Two procedures feed a [`TrackerConfig`]:
//!
//! - **Threshold**: record RSSI while the swimmer holds position at the turn
//!   point that should separate near from far, then take the median.
//! - **Model**: record RSSI at several known distances and fit
//!   `rssi = offset + scale * ln(distance)` by least squares.
//!
//! [`TrackerConfig`]: crate::config::TrackerConfig

use std::fmt;

use crate::config::TrackerConfig;
use crate::constants::NULL_RSSI;
use crate::distance::{DistanceEstimator, LogarithmicModel};
use crate::error::{CalibrationError, LapCountError};
use crate::types::LapMetric;

/// Summary statistics over collected readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RssiSummary {
    pub count: usize,
    pub min: i32,
    pub max: i32,
    pub mean: f64,
    pub median: f64,
}

impl fmt::Display for RssiSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} min={} dBm max={} dBm mean={:.1} dBm median={:.1} dBm",
            self.count, self.min, self.max, self.mean, self.median
        )
    }
}

/// Accumulates RSSI readings while enabled.
#[derive(Debug, Clone, Default)]
pub struct RssiCollector {
    enabled: bool,
    samples: Vec<i32>,
}

impl RssiCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records `rssi` if collection is enabled. Null readings are skipped.
    ///
    /// # Returns
    /// `true` if the reading was kept.
    pub fn collect(&mut self, rssi: i32) -> bool {
        if !self.enabled || rssi == NULL_RSSI {
            return false;
        }
        self.samples.push(rssi);
        true
    }

    /// Drops all readings. Does not change the enabled flag.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn min(&self) -> Option<i32> {
        self.samples.iter().copied().min()
    }

    pub fn max(&self) -> Option<i32> {
        self.samples.iter().copied().max()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|&s| f64::from(s)).sum();
        Some(sum / self.samples.len() as f64)
    }

    /// Median reading; the mean of the two middle readings for an even count.
    pub fn median(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0
        } else {
            f64::from(sorted[mid])
        };
        Some(median)
    }

    pub fn summary(&self) -> Option<RssiSummary> {
        Some(RssiSummary {
            count: self.samples.len(),
            min: self.min()?,
            max: self.max()?,
            mean: self.mean()?,
            median: self.median()?,
        })
    }

    /// Lap threshold derived from the median reading.
    ///
    /// # Errors
    /// - [`CalibrationError::NotEnoughSamples`] - nothing collected
    pub fn threshold(
        &self,
        metric: LapMetric,
        model: &LogarithmicModel,
    ) -> Result<f64, CalibrationError> {
        let median = self.median().ok_or(CalibrationError::NotEnoughSamples {
            needed: 1,
            got: 0,
        })?;
        Ok(match metric {
            LapMetric::Distance => model.distance(median),
            LapMetric::SignalMagnitude => median.abs(),
        })
    }
}

/// Returns `base` with its threshold replaced by the one `collector` measured.
///
/// The threshold is expressed in `base.lap_metric` and, for distances,
/// through the model in `base`.
///
/// # Errors
/// - [`LapCountError::Config`] - `base` fails validation
/// - [`LapCountError::Calibration`] - `collector` holds no samples
pub fn calibrate_threshold(
    base: &TrackerConfig,
    collector: &RssiCollector,
) -> Result<TrackerConfig, LapCountError> {
    base.validate()?;
    let model = LogarithmicModel::new(base.offset, base.scale)?;
    let threshold = collector.threshold(base.lap_metric, &model)?;
    Ok(TrackerConfig {
        threshold,
        ..base.clone()
    })
}

/// One reference measurement: mean RSSI observed at a known distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub distance: f64,
    pub rssi: f64,
}

/// Least-squares fit of `rssi = offset + scale * ln(distance)`.
///
/// # Errors
/// - [`CalibrationError::NotEnoughSamples`] - fewer than two points
/// - [`CalibrationError::InvalidDistance`] - a distance is not positive and finite
/// - [`CalibrationError::DegenerateDistances`] - every point at the same distance
/// - [`CalibrationError::FlatResponse`] - fitted slope is zero or not finite
pub fn fit_logarithmic_model(
    points: &[CalibrationPoint],
) -> Result<LogarithmicModel, CalibrationError> {
    if points.len() < 2 {
        return Err(CalibrationError::NotEnoughSamples {
            needed: 2,
            got: points.len(),
        });
    }
    if let Some(bad) = points
        .iter()
        .find(|p| !(p.distance.is_finite() && p.distance > 0.0))
    {
        return Err(CalibrationError::InvalidDistance {
            distance: bad.distance,
        });
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.distance.ln()).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.rssi).sum::<f64>() / n;

    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), p| {
        let dx = p.distance.ln() - mean_x;
        (sxx + dx * dx, sxy + dx * (p.rssi - mean_y))
    });
    if sxx == 0.0 {
        return Err(CalibrationError::DegenerateDistances);
    }

    let scale = sxy / sxx;
    if scale == 0.0 || !scale.is_finite() {
        return Err(CalibrationError::FlatResponse);
    }
    let offset = mean_y - scale * mean_x;

    LogarithmicModel::new(offset, scale).map_err(|_| CalibrationError::FlatResponse)
}
