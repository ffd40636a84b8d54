//! Common test utilities for lap counting integration tests.
//!
//! Helpers for building trackers and counters with test-friendly window sizes.

#![allow(dead_code)] // Not every test file uses every helper

use lapcount::{
    DistanceTracker, LapCounter, SampleOutcome, SlidingWindowCounter, TrackerConfig, Zone,
};

/// Threshold used by the end-to-end scenarios, in model distance units.
pub const TEST_THRESHOLD: f64 = 3.0;

/// Lap units credited per round trip in tests.
pub const TEST_LAP_INCREMENT: u32 = 2;

/// Tracker configuration without smoothing, so every RSSI maps straight to a distance.
///
/// # Parameters
/// - `lap_window_size`: Number of deltas the lap counter sums.
///
/// # Returns
/// A `TrackerConfig` with a one-sample filter and default calibration.
pub fn unfiltered_config(lap_window_size: usize) -> TrackerConfig {
    TrackerConfig {
        threshold: TEST_THRESHOLD,
        filter_window_size: 1,
        lap_window_size,
        lap_increment: TEST_LAP_INCREMENT,
        ..Default::default()
    }
}

/// Creates a tracker from `config` and delivers the first `connected` event.
pub fn connected_tracker(config: &TrackerConfig) -> DistanceTracker {
    let mut tracker = DistanceTracker::new(config).expect("valid test config");
    tracker.on_connected();
    tracker
}

/// Pushes every reading and returns the lap count after the last processed one.
///
/// # Panics
/// Panics if any reading is not processed.
pub fn push_all(tracker: &mut DistanceTracker, readings: &[i32]) -> u32 {
    for &rssi in readings {
        match tracker.push_sample(rssi) {
            SampleOutcome::Processed(_) => {}
            other => panic!("RSSI {} not processed: {:?}", rssi, other),
        }
    }
    tracker.lap_count()
}

/// Lap counter that has picked `Near` at distance 1.0 with a window of zero deltas.
pub fn settled_near_counter(window_size: usize) -> SlidingWindowCounter {
    let mut counter =
        SlidingWindowCounter::new(TEST_THRESHOLD, window_size, TEST_LAP_INCREMENT).unwrap();
    for _ in 0..=window_size {
        counter.update_count(1.0);
    }
    counter.pick_zone(false);
    assert_eq!(counter.zone(), Zone::Near);
    counter
}

/// Feeds distances to `counter`, returning the lap count after the last one.
pub fn feed_distances(counter: &mut SlidingWindowCounter, distances: &[f64]) -> u32 {
    distances
        .iter()
        .fold(counter.lap_count(), |_, &d| counter.update_count(d))
}
