//! Zone transition rules for the lap counter.
//!
//! Pure functions of `(zone, observation)`; the counter owns the state and
//! applies the returned [`ZoneStep`].

use crate::types::{Direction, Zone};

/// One judged sample: the latest distance and the net direction over the full delta window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneObservation {
    pub distance: f64,
    pub direction: Direction,
}

/// Outcome of a transition: the zone to move to and the lap units to credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneStep {
    pub zone: Zone,
    pub laps_credited: u32,
}

impl ZoneStep {
    #[inline]
    const fn stay(zone: Zone) -> Self {
        Self {
            zone,
            laps_credited: 0,
        }
    }
}

/// Applies the hysteresis rules to a full delta window.
///
/// - `Near`, beyond `threshold`, moving outward: `Far`.
/// - `Far`, at or within `threshold`, moving inward: `Near`, credit `lap_increment`.
///
/// Everything else, including any `Unknown` zone and a `Steady` direction,
/// leaves the zone unchanged.
pub fn step_zone(
    zone: Zone,
    observation: ZoneObservation,
    threshold: f64,
    lap_increment: u32,
) -> ZoneStep {
    use Direction::*;

    match (zone, observation.direction) {
        (Zone::Near, Outward) if observation.distance > threshold => ZoneStep::stay(Zone::Far),
        (Zone::Far, Inward) if observation.distance <= threshold => ZoneStep {
            zone: Zone::Near,
            laps_credited: lap_increment,
        },
        _ => ZoneStep::stay(zone),
    }
}

/// Chooses a zone from scratch once the delta window has refilled after a
/// (re)connect.
///
/// Plain threshold test with no hysteresis, since no delta history spans the
/// gap. On a reconnect where the swimmer left `Far` and comes back `Near`,
/// one round trip is assumed to have completed unseen and `lap_increment` is
/// credited. Zero or several missed trips are indistinguishable from one.
pub fn pick_zone(
    snapshot: Zone,
    distance: f64,
    threshold: f64,
    is_reconnect: bool,
    lap_increment: u32,
) -> ZoneStep {
    let zone = if distance < threshold {
        Zone::Near
    } else {
        Zone::Far
    };

    let laps_credited = match (is_reconnect, snapshot, zone) {
        (true, Zone::Far, Zone::Near) => lap_increment,
        _ => 0,
    };

    ZoneStep {
        zone,
        laps_credited,
    }
}

/// Carries the zone a connectivity gap started from across samples judged
/// while the zone is still `Unknown`.
///
/// Only `Near` to `Far` moves: a swimmer seen heading out past `threshold`
/// during the gap was far, whatever the zone at the drop. The far-to-near
/// credit stays with [`pick_zone`].
pub fn advance_gap_snapshot(
    snapshot: Zone,
    observation: ZoneObservation,
    threshold: f64,
) -> Zone {
    match (snapshot, observation.direction) {
        (Zone::Near, Direction::Outward) if observation.distance > threshold => Zone::Far,
        _ => snapshot,
    }
}
