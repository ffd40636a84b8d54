//! `lapcount`: lap counting from the signal strength of a short-range radio beacon.
//!
//! A swimmer carries (or passes) a beacon at one end of the pool. Each RSSI
//! reading is smoothed, converted to an estimated distance, and fed to a
//! hysteresis state machine that counts round trips past a distance
//! threshold. The count never decreases, and connectivity gaps are absorbed
//! with a bounded recovery heuristic.
//!
//! ## Core Concepts
//!
//! - **[`DistanceTracker`]**: one tracking session. The host pushes raw
//!   samples and `connected`/`disconnected` events into it and reads back
//!   the filtered RSSI, distance, lap count and zone.
//! - **[`MovingAverage`]**: low-pass filter over the last N readings.
//! - **[`LogarithmicModel`]**: calibrated RSSI → distance model.
//! - **[`DisconnectDetector`]**: spots a link that keeps replaying a cached reading.
//! - **[`SlidingWindowCounter`]**: the NEAR / FAR / UNKNOWN lap state machine.
//!
//! ## Quick Start
//!
//! ```rust
//! use lapcount::{DistanceTracker, SampleOutcome, TrackerConfig, Zone};
//!
//! fn main() -> Result<(), lapcount::ConfigError> {
//!     let config = TrackerConfig {
//!         threshold: 3.0,
//!         ..Default::default()
//!     };
//!     let mut tracker = DistanceTracker::new(&config)?;
//!
//!     tracker.on_connected();
//!     for rssi in [-60, -61, -59, -62, -60, -61, -60, -59, -61, -60] {
//!         if let SampleOutcome::Processed(reading) = tracker.push_sample(rssi) {
//!             println!("{:.2} m, {} laps", reading.distance, reading.lap_count);
//!         }
//!     }
//!     assert_eq!(tracker.zone(), Zone::Near);
//!
//!     tracker.on_disconnected();
//!     assert_eq!(tracker.zone(), Zone::Unknown);
//!     Ok(())
//! }
//! ```
//!
//! ## Known Limits
//!
//! After a reconnect the zone is re-picked from a plain threshold test. If the
//! swimmer was FAR when the link dropped and is NEAR when it comes back, exactly
//! one round trip is credited. Zero or several round trips during the gap are
//! indistinguishable from one, so long gaps can under- or over-count.
//!
//! A gap lasts until the zone is picked again. A stall that recurs before then
//! keeps the zone recorded at the first drop, and a swimmer seen moving out
//! past the threshold inside the gap counts as FAR for the recredit.

pub mod calibration;
pub mod config;
pub mod constants;
pub mod disconnect;
pub mod distance;
pub mod error;
pub mod filter;
pub mod lap_counter;
pub mod tracker;
pub mod types;
pub mod window;
pub mod zone_transitions;

pub use calibration::{
    CalibrationPoint, RssiCollector, RssiSummary, calibrate_threshold, fit_logarithmic_model,
};
pub use config::TrackerConfig;
pub use disconnect::DisconnectDetector;
pub use distance::{DistanceEstimator, LogarithmicModel};
pub use error::{CalibrationError, ConfigError, LapCountError, Parameter};
pub use filter::{LowPassFilter, MovingAverage};
pub use lap_counter::{LapCounter, SlidingWindowCounter};
pub use tracker::{
    ConnectionKind, DistanceTracker, IgnoreReason, LinkState, Reading, SampleOutcome,
    TrackerSnapshot,
};
pub use types::{Direction, LapMetric, Zone};
pub use window::SlidingWindow;
