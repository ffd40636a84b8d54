//! Low-pass filtering of raw RSSI readings.
//!
//! RSSI is noisy enough that a single reading says little about distance.
//! The filter smooths the stream before it reaches the distance model.

use std::fmt::Debug;
use std::num::NonZeroUsize;

use crate::error::{ConfigError, Parameter};
use crate::window::SlidingWindow;

/// A stateful smoothing filter over a scalar stream.
pub trait LowPassFilter: Debug {
    /// Adds `value` to the filter state and returns the new filtered value.
    fn filter(&mut self, value: f64) -> f64;

    /// Drops all state, e.g. after a disconnect so stale readings do not
    /// bleed into the next connection.
    fn clear(&mut self);

    /// Whether the filter has seen enough samples since the last clear to be
    /// fully settled.
    fn is_full(&self) -> bool;

    /// Current filtered value without adding a sample.
    fn value(&self) -> f64;
}

/// Arithmetic mean of the last N readings.
///
/// Output depends only on N and the readings since the last [`clear`].
/// Until N readings have arrived the mean covers only what has been seen.
///
/// [`clear`]: LowPassFilter::clear
#[derive(Debug, Clone)]
pub struct MovingAverage {
    values: SlidingWindow<f64>,
}

impl MovingAverage {
    /// Creates a moving average over `window_size` readings.
    ///
    /// # Errors
    /// - [`ConfigError::ZeroSize`] - `window_size` is 0
    pub fn new(window_size: usize) -> Result<Self, ConfigError> {
        let capacity = NonZeroUsize::new(window_size).ok_or(ConfigError::ZeroSize {
            parameter: Parameter::FilterWindowSize,
        })?;
        Ok(Self {
            values: SlidingWindow::new(capacity),
        })
    }

    /// Number of readings currently averaged.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.values.capacity()
    }
}

impl LowPassFilter for MovingAverage {
    fn filter(&mut self, value: f64) -> f64 {
        self.values.push(value);
        self.value()
    }

    fn clear(&mut self) {
        self.values.clear();
    }

    fn is_full(&self) -> bool {
        self.values.is_full()
    }

    fn value(&self) -> f64 {
        // Empty buffer reads as 0 rather than dividing by zero.
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.sum() / self.values.len() as f64
    }
}
