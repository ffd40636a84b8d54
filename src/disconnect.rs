//! Early detection of a dead radio link.
//!
//! After an abrupt disconnect the radio stack keeps reporting its last cached
//! RSSI for 10 to 20 seconds before it emits the formal disconnect
//! notification. A run of identical readings is the earliest sign of that.

use std::num::NonZeroU32;

use crate::error::{ConfigError, Parameter};

/// Counts consecutive identical RSSI readings.
#[derive(Debug, Clone)]
pub struct DisconnectDetector {
    repeat_threshold: NonZeroU32,
    previous: Option<i32>,
    consecutive: u32,
}

impl DisconnectDetector {
    /// Creates a detector that fires after `repeat_threshold` identical readings.
    ///
    /// # Errors
    /// - [`ConfigError::ZeroSize`] - `repeat_threshold` is 0
    pub fn new(repeat_threshold: u32) -> Result<Self, ConfigError> {
        let repeat_threshold = NonZeroU32::new(repeat_threshold).ok_or(ConfigError::ZeroSize {
            parameter: Parameter::DisconnectRepeatCount,
        })?;
        Ok(Self {
            repeat_threshold,
            previous: None,
            consecutive: 0,
        })
    }

    /// Records `rssi` and reports whether the link should be treated as lost.
    ///
    /// Keeps returning `true` for further identical readings until [`reset`].
    ///
    /// [`reset`]: Self::reset
    pub fn should_disconnect(&mut self, rssi: i32) -> bool {
        if self.previous == Some(rssi) {
            self.consecutive = self.consecutive.saturating_add(1);
        } else {
            self.previous = Some(rssi);
            self.consecutive = 1;
        }
        self.consecutive >= self.repeat_threshold.get()
    }

    /// Forgets the current run. Call on every reconnect and confirmed disconnect.
    pub fn reset(&mut self) {
        self.previous = None;
        self.consecutive = 0;
    }

    /// Length of the current run of identical readings.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn repeat_threshold(&self) -> u32 {
        self.repeat_threshold.get()
    }
}
