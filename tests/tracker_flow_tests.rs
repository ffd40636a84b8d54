//! Integration tests for a full tracking session.
//!
//! Uses the default calibration (offset -64.1, scale -7.47) with a one-sample
//! filter, a three-delta lap window and a distance threshold of 3.0. Under that
//! model -72 dBm sits just inside the threshold and -73 dBm just outside:
//!
//! | RSSI | distance |
//! |------|----------|
//! |  -60 | 0.578    |
//! |  -62 | 0.755    |
//! |  -66 | 1.290    |
//! |  -70 | 2.203    |
//! |  -74 | 3.763    |
//! |  -78 | 6.429    |

mod common;

use common::{connected_tracker, push_all, unfiltered_config};
use lapcount::{
    ConnectionKind, DistanceTracker, IgnoreReason, LinkState, SampleOutcome, TrackerConfig, Zone,
};

const SETTLE_NEAR: [i32; 3] = [-60, -61, -62];
const SWIM_OUT: [i32; 4] = [-66, -70, -74, -78];
const SWIM_BACK: [i32; 2] = [-74, -70];

/// Tracker that has completed one round trip and is heading out again (zone `Far`).
fn tracker_far_after_one_lap() -> DistanceTracker {
    let mut tracker = connected_tracker(&unfiltered_config(3));
    push_all(&mut tracker, &SETTLE_NEAR);
    push_all(&mut tracker, &SWIM_OUT);
    push_all(&mut tracker, &SWIM_BACK);
    assert_eq!(tracker.lap_count(), 2);
    push_all(&mut tracker, &[-74, -78]);
    assert_eq!(tracker.zone(), Zone::Far);
    tracker
}

/// Zone is picked as soon as the lap window fills on the first connection.
#[test]
fn first_connection_settles_near_without_credit() {
    let mut tracker = connected_tracker(&unfiltered_config(3));
    push_all(&mut tracker, &SETTLE_NEAR[..2]);
    assert_eq!(tracker.zone(), Zone::Unknown);

    push_all(&mut tracker, &SETTLE_NEAR[2..]);
    assert_eq!(tracker.zone(), Zone::Near);
    assert_eq!(tracker.lap_count(), 0);
}

/// Swimming out past the threshold and back credits one round trip.
#[test]
fn out_and_back_credits_one_round_trip() {
    let mut tracker = connected_tracker(&unfiltered_config(3));
    push_all(&mut tracker, &SETTLE_NEAR);

    push_all(&mut tracker, &SWIM_OUT[..2]);
    assert_eq!(tracker.zone(), Zone::Near);
    push_all(&mut tracker, &SWIM_OUT[2..3]);
    assert_eq!(tracker.zone(), Zone::Far);
    push_all(&mut tracker, &SWIM_OUT[3..]);
    assert_eq!(tracker.zone(), Zone::Far);

    // Back at -74 the window still points outward.
    push_all(&mut tracker, &SWIM_BACK[..1]);
    assert_eq!(tracker.zone(), Zone::Far);
    assert_eq!(tracker.lap_count(), 0);

    assert_eq!(push_all(&mut tracker, &SWIM_BACK[1..]), 2);
    assert_eq!(tracker.zone(), Zone::Near);
}

/// Heading out again after a credited lap leaves the count alone.
#[test]
fn second_outbound_leg_keeps_count() {
    let mut tracker = tracker_far_after_one_lap();
    assert_eq!(tracker.lap_count(), 2);
    assert!(tracker.distance() > 6.0);
}

/// Far at disconnect and near after reconnect credits the missed round trip.
#[test]
fn reconnect_near_after_far_disconnect_recredits() {
    let mut tracker = tracker_far_after_one_lap();

    tracker.on_disconnected();
    assert_eq!(tracker.zone(), Zone::Unknown);
    assert_eq!(tracker.link_state(), LinkState::Disconnected);
    assert_eq!(
        tracker.push_sample(-62),
        SampleOutcome::Ignored(IgnoreReason::NotConnected)
    );

    assert_eq!(tracker.on_connected(), ConnectionKind::Reconnect(2));
    push_all(&mut tracker, &[-62, -61]);
    assert_eq!(tracker.zone(), Zone::Unknown);
    assert_eq!(push_all(&mut tracker, &[-60]), 4);
    assert_eq!(tracker.zone(), Zone::Near);
}

/// Far at disconnect and still far after reconnect credits nothing.
#[test]
fn reconnect_far_after_far_disconnect_credits_nothing() {
    let mut tracker = tracker_far_after_one_lap();
    tracker.on_disconnected();
    tracker.on_connected();

    assert_eq!(push_all(&mut tracker, &[-76, -77, -78]), 2);
    assert_eq!(tracker.zone(), Zone::Far);
}

/// A replayed reading stalls the link; the formal notification then does
/// not tear down a second time and the reconnect still recredits.
#[test]
fn stuck_link_is_detected_before_formal_disconnect() {
    let mut tracker = tracker_far_after_one_lap();

    // -78 was just processed once; three more still count.
    push_all(&mut tracker, &[-78, -78, -78]);
    assert_eq!(tracker.zone(), Zone::Far);
    assert_eq!(
        tracker.push_sample(-78),
        SampleOutcome::LinkStalled { stuck_rssi: -78 }
    );
    assert_eq!(tracker.zone(), Zone::Unknown);
    assert_eq!(tracker.filtered_rssi(), 0.0);

    for _ in 0..10 {
        assert_eq!(
            tracker.push_sample(-78),
            SampleOutcome::Ignored(IgnoreReason::StaleReading)
        );
    }

    tracker.on_disconnected();
    assert_eq!(tracker.counter().disconnect_snapshot(), Zone::Far);
    assert_eq!(tracker.on_connected(), ConnectionKind::Reconnect(2));

    assert_eq!(push_all(&mut tracker, &SETTLE_NEAR), 4);
    assert_eq!(tracker.zone(), Zone::Near);
}

/// Smoothed session used by the gap scenarios: six-sample filter, three-delta
/// lap window, default stall length of five.
fn smoothed_config() -> TrackerConfig {
    TrackerConfig {
        filter_window_size: 6,
        ..unfiltered_config(3)
    }
}

/// Pushes `rssi` until the detector trips, checking every earlier copy is processed.
fn push_until_stalled(tracker: &mut DistanceTracker, rssi: i32, processed_before: usize) {
    push_all(tracker, &vec![rssi; processed_before]);
    assert_eq!(
        tracker.push_sample(rssi),
        SampleOutcome::LinkStalled { stuck_rssi: rssi }
    );
}

/// A second stall before the zone is re-picked still credits the lap missed
/// since the swimmer was last seen far.
#[test]
fn chained_stalls_keep_far_snapshot_until_repick() {
    let mut tracker = connected_tracker(&smoothed_config());
    push_all(&mut tracker, &[-60, -61, -62, -60, -61, -62]);
    assert_eq!(tracker.zone(), Zone::Near);

    push_all(&mut tracker, &[-80, -81, -82, -83]);
    assert_eq!(tracker.zone(), Zone::Far);

    push_all(&mut tracker, &[-84]);
    push_until_stalled(&mut tracker, -85, 4);
    assert_eq!(tracker.counter().disconnect_snapshot(), Zone::Far);

    // Recovers, but stalls again before the filter refills.
    push_until_stalled(&mut tracker, -86, 4);
    assert_eq!(tracker.zone(), Zone::Unknown);
    assert_eq!(tracker.counter().disconnect_snapshot(), Zone::Far);

    push_all(&mut tracker, &[-60, -61, -62, -60, -61]);
    assert_eq!(tracker.zone(), Zone::Unknown);
    assert_eq!(push_all(&mut tracker, &[-62]), 2);
    assert_eq!(tracker.zone(), Zone::Near);
    assert_eq!(tracker.connection_count(), 3);
}

/// A stall while near, followed by the swimmer leaving and coming back
/// before the zone is re-picked, credits one round trip.
#[test]
fn leaving_during_gap_credits_round_trip_on_return() {
    let mut tracker = connected_tracker(&smoothed_config());
    push_all(&mut tracker, &[-60, -61, -62, -60, -61, -62]);
    assert_eq!(tracker.zone(), Zone::Near);

    push_until_stalled(&mut tracker, -62, 3);
    assert_eq!(tracker.counter().disconnect_snapshot(), Zone::Near);

    push_all(&mut tracker, &[-80, -81, -82]);
    assert_eq!(tracker.zone(), Zone::Unknown);
    assert_eq!(tracker.counter().disconnect_snapshot(), Zone::Far);

    push_all(&mut tracker, &[-60, -61]);
    assert_eq!(tracker.zone(), Zone::Unknown);
    assert_eq!(push_all(&mut tracker, &[-62]), 2);
    assert_eq!(tracker.zone(), Zone::Near);
    assert_eq!(tracker.connection_count(), 2);
}

/// A fresh reading after a stall is treated as an implicit reconnect.
#[test]
fn stalled_link_recovers_on_fresh_reading() {
    let mut tracker = tracker_far_after_one_lap();
    push_all(&mut tracker, &[-78, -78, -78]);
    tracker.push_sample(-78);
    assert!(!tracker.is_connected());

    assert_eq!(push_all(&mut tracker, &SETTLE_NEAR), 4);
    assert_eq!(tracker.connection_count(), 2);
    assert_eq!(tracker.link_state(), LinkState::Connected);
}

/// Null readings never touch the pipeline, even mid-session.
#[test]
fn null_readings_are_skipped_mid_session() {
    let mut tracker = connected_tracker(&unfiltered_config(3));
    push_all(&mut tracker, &SETTLE_NEAR);
    let before = tracker.snapshot();

    assert_eq!(
        tracker.push_sample(0),
        SampleOutcome::Ignored(IgnoreReason::NullReading)
    );
    assert_eq!(tracker.snapshot(), before);
}

/// Polling speeds up while the zone is unknown and slows once it is settled.
#[test]
fn poll_interval_tracks_zone() {
    let config = unfiltered_config(3);
    let mut tracker = connected_tracker(&config);
    assert_eq!(tracker.poll_interval(), config.fast_poll_interval);

    push_all(&mut tracker, &SETTLE_NEAR);
    assert_eq!(tracker.poll_interval(), config.poll_interval);

    tracker.on_disconnected();
    assert_eq!(tracker.poll_interval(), config.fast_poll_interval);
}

/// The default ten-sample filter delays the zone pick until it is full.
#[test]
fn default_filter_delays_zone_pick() {
    let config = TrackerConfig {
        threshold: 3.0,
        ..Default::default()
    };
    let mut tracker = connected_tracker(&config);

    push_all(&mut tracker, &[-60; 4]);
    push_all(&mut tracker, &[-61; 4]);
    push_all(&mut tracker, &[-60]);
    assert_eq!(tracker.zone(), Zone::Unknown);

    push_all(&mut tracker, &[-62]);
    assert_eq!(tracker.zone(), Zone::Near);
    assert!((tracker.filtered_rssi() - -60.6).abs() < 1e-9);
}

/// Snapshots serialize with the zone and link state in wire form.
#[test]
fn snapshot_serializes_for_display() {
    let mut tracker = connected_tracker(&unfiltered_config(3));
    push_all(&mut tracker, &SETTLE_NEAR);

    let json = serde_json::to_value(tracker.snapshot()).unwrap();
    assert_eq!(json["zone"], "NEAR");
    assert_eq!(json["link"]["state"], "connected");
    assert_eq!(json["lap_count"], 0);
    assert_eq!(json["connection_count"], 1);
}
