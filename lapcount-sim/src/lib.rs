//! Core library for the lapcount deterministic simulator.
//!
//! A simulated swimmer moves back and forth between two distances from a
//! beacon. [`BeaconChannel`] turns the true distance into the event stream a
//! radio stack would deliver: noisy integer RSSI samples, null readings,
//! cached readings after the swimmer leaves range, and delayed reconnects.
//! [`LapSimulator`] drives a [`DistanceTracker`] with that stream and checks
//! the final lap count against the true number of round trips.

use std::fmt;
use std::path::{Path, PathBuf};

use lapcount::{
    ConfigError, ConnectionKind, DistanceTracker, LogarithmicModel, SampleOutcome, TrackerConfig,
};
use rand::prelude::*;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Configuration for a simulation scenario.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub seed: u64,
    pub num_samples: usize,
    /// Closest approach to the beacon, in metres.
    pub near_distance: f64,
    /// Turn point farthest from the beacon, in metres.
    pub far_distance: f64,
    /// Samples taken while swimming one length.
    pub samples_per_length: usize,
    /// Half-width of the uniform noise added to every RSSI, in dBm.
    pub rssi_noise: f64,
    /// Probability that the radio reports its null value instead of a reading.
    pub null_reading_probability: f64,
    /// Link drops while the swimmer is farther than this. `None` for unlimited range.
    pub dropout_distance: Option<f64>,
    /// Cached readings the radio replays after the drop, before it reports the disconnect.
    pub stuck_samples: usize,
    /// Samples back in range before the radio reconnects.
    pub reconnect_delay: usize,
    pub tracker: TrackerConfig,
    /// Allowed difference between the final and the true lap count.
    pub lap_tolerance: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        let tracker = TrackerConfig::default();
        Self {
            seed: 0,
            num_samples: 200,
            near_distance: 0.5,
            far_distance: 8.0,
            samples_per_length: 20,
            rssi_noise: 0.0,
            null_reading_probability: 0.0,
            dropout_distance: None,
            stuck_samples: 0,
            reconnect_delay: 0,
            lap_tolerance: tracker.lap_increment,
            tracker,
        }
    }
}

impl SimConfig {
    /// Whether the channel delivers every reading exactly.
    pub fn is_ideal_channel(&self) -> bool {
        self.rssi_noise == 0.0
            && self.null_reading_probability == 0.0
            && self.dropout_distance.is_none()
    }

    fn validate(&self) -> Result<(), SimError> {
        let invalid = |reason| Err(SimError::InvalidConfig { reason });
        if !(self.near_distance.is_finite() && self.near_distance > 0.0) {
            return invalid("near_distance must be positive and finite");
        }
        if !(self.far_distance.is_finite() && self.far_distance > self.near_distance) {
            return invalid("far_distance must be finite and beyond near_distance");
        }
        if self.samples_per_length == 0 {
            return invalid("samples_per_length must be at least 1");
        }
        if !(self.rssi_noise.is_finite() && self.rssi_noise >= 0.0) {
            return invalid("rssi_noise must be non-negative and finite");
        }
        if !(0.0..=1.0).contains(&self.null_reading_probability) {
            return invalid("null_reading_probability must lie in [0, 1]");
        }
        if self
            .dropout_distance
            .is_some_and(|d| !(d.is_finite() && d > self.near_distance))
        {
            return invalid("dropout_distance must be finite and beyond near_distance");
        }
        Ok(())
    }
}

/// Errors that can occur during a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid simulation config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("invalid tracker config: {0}")]
    Tracker(#[from] ConfigError),

    #[error("failed to read tracker config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tracker config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("lap count decreased at sample {sample}: {before} -> {after}")]
    LapCountDecreased { sample: usize, before: u32, after: u32 },

    #[error("final lap count {actual} differs from expected {expected} by more than {tolerance}")]
    LapCountMismatch {
        expected: u32,
        actual: u32,
        tolerance: u32,
    },
}

/// Reads a JSON tracker configuration and validates it.
///
/// Fields missing from the file take their defaults.
///
/// # Errors
/// - [`SimError::ConfigRead`] - the file cannot be read
/// - [`SimError::ConfigParse`] - the file is not a valid tracker config document
/// - [`SimError::Tracker`] - the parsed values fail validation
pub fn load_tracker_config(path: &Path) -> Result<TrackerConfig, SimError> {
    let text = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: TrackerConfig =
        serde_json::from_str(&text).map_err(|source| SimError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    info!(path = %path.display(), ?config, "loaded tracker config");
    Ok(config)
}

/// Triangle-wave swimmer path starting at the near end.
///
/// Yields one true distance per sample and counts the round trips completed
/// so far.
#[derive(Debug, Clone)]
pub struct SwimmerPath {
    near: f64,
    far: f64,
    samples_per_length: usize,
    index: usize,
    round_trips: u32,
}

impl SwimmerPath {
    /// Creates a path between `near` and `far` metres.
    ///
    /// # Parameters
    /// - `near`: Distance at the start and at every completed round trip
    /// - `far`: Distance at the turn point
    /// - `samples_per_length`: Samples per length; must be nonzero
    ///
    /// # Returns
    /// A `SwimmerPath` positioned at the near end.
    pub fn new(near: f64, far: f64, samples_per_length: usize) -> Self {
        debug_assert!(samples_per_length > 0);
        Self {
            near,
            far,
            samples_per_length,
            index: 0,
            round_trips: 0,
        }
    }

    /// Round trips completed by the samples yielded so far.
    pub fn round_trips(&self) -> u32 {
        self.round_trips
    }

    fn distance_at(&self, index: usize) -> f64 {
        let length = self.samples_per_length;
        let phase = index % (2 * length);
        let fraction = if phase <= length {
            phase as f64 / length as f64
        } else {
            (2 * length - phase) as f64 / length as f64
        };
        self.near + (self.far - self.near) * fraction
    }
}

impl Iterator for SwimmerPath {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let index = self.index;
        if index > 0 && index % (2 * self.samples_per_length) == 0 {
            self.round_trips += 1;
        }
        self.index += 1;
        Some(self.distance_at(index))
    }
}

/// Event delivered by the simulated radio stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Disconnected,
    Sample(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    Down { wait: usize },
    Up,
    Stuck { rssi: i32, remaining: usize },
}

/// Represents the simulated radio link.
#[derive(Debug)]
pub struct BeaconChannel {
    rng: StdRng,
    model: LogarithmicModel,
    state: ChannelState,
    last_rssi: i32,
    rssi_noise: f64,
    null_reading_probability: f64,
    dropout_distance: Option<f64>,
    stuck_samples: usize,
    reconnect_delay: usize,
}

impl BeaconChannel {
    /// Creates a channel that is disconnected and connects on the first in-range tick.
    ///
    /// # Parameters
    /// - `seed`: Random seed for reproducible noise and null readings
    /// - `model`: Model used to turn true distances into RSSI
    /// - `config`: Channel impairments
    pub fn new(seed: u64, model: LogarithmicModel, config: &SimConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            model,
            state: ChannelState::Down { wait: 0 },
            last_rssi: lapcount::constants::NULL_RSSI,
            rssi_noise: config.rssi_noise,
            null_reading_probability: config.null_reading_probability,
            dropout_distance: config.dropout_distance,
            stuck_samples: config.stuck_samples,
            reconnect_delay: config.reconnect_delay,
        }
    }

    /// Advances the channel by one poll with the swimmer at `distance`.
    ///
    /// # Returns
    /// The event the radio stack delivers this poll, if any.
    pub fn tick(&mut self, distance: f64) -> Option<LinkEvent> {
        let in_range = self.dropout_distance.is_none_or(|range| distance <= range);

        match self.state {
            ChannelState::Down { .. } if !in_range => {
                self.state = ChannelState::Down {
                    wait: self.reconnect_delay,
                };
                None
            }
            ChannelState::Down { wait } if wait > 0 => {
                self.state = ChannelState::Down { wait: wait - 1 };
                None
            }
            ChannelState::Down { .. } => {
                self.state = ChannelState::Up;
                Some(LinkEvent::Connected)
            }
            ChannelState::Up if in_range => Some(LinkEvent::Sample(self.measure(distance))),
            ChannelState::Up => {
                self.state = ChannelState::Stuck {
                    rssi: self.last_rssi,
                    remaining: self.stuck_samples,
                };
                Some(self.replay_or_drop())
            }
            ChannelState::Stuck { .. } => Some(self.replay_or_drop()),
        }
    }

    fn measure(&mut self, distance: f64) -> i32 {
        if self.null_reading_probability > 0.0 && self.rng.random_bool(self.null_reading_probability)
        {
            return lapcount::constants::NULL_RSSI;
        }
        let noise = if self.rssi_noise > 0.0 {
            self.rng.random_range(-self.rssi_noise..=self.rssi_noise)
        } else {
            0.0
        };
        // Radios report whole dBm and never the null value for a real reading.
        let rssi = ((self.model.rssi_at(distance) + noise).round() as i32).min(-1);
        self.last_rssi = rssi;
        rssi
    }

    fn replay_or_drop(&mut self) -> LinkEvent {
        match self.state {
            ChannelState::Stuck { rssi, remaining } if remaining > 0 => {
                self.state = ChannelState::Stuck {
                    rssi,
                    remaining: remaining - 1,
                };
                LinkEvent::Sample(rssi)
            }
            _ => {
                self.state = ChannelState::Down {
                    wait: self.reconnect_delay,
                };
                LinkEvent::Disconnected
            }
        }
    }
}

/// Counters collected over one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimReport {
    pub samples: usize,
    pub processed: usize,
    pub ignored: usize,
    pub connections: u32,
    pub disconnects: u32,
    pub stalls: u32,
    pub round_trips: u32,
    pub expected_count: u32,
    pub final_count: u32,
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples ({} processed, {} ignored), {} connections, {} disconnects, {} stalls, \
             laps {}/{} over {} round trips",
            self.samples,
            self.processed,
            self.ignored,
            self.connections,
            self.disconnects,
            self.stalls,
            self.final_count,
            self.expected_count,
            self.round_trips
        )
    }
}

/// Orchestrates a single deterministic simulation run.
#[derive(Debug)]
pub struct LapSimulator {
    config: SimConfig,
    tracker: DistanceTracker,
    path: SwimmerPath,
    channel: BeaconChannel,
}

impl LapSimulator {
    /// Creates a simulation from `config`.
    ///
    /// # Errors
    /// - [`SimError::InvalidConfig`] - swim geometry or channel settings out of range
    /// - [`SimError::Tracker`] - the tracker rejected `config.tracker`
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let tracker = DistanceTracker::new(&config.tracker)?;
        let model = *tracker.model();
        let path = SwimmerPath::new(
            config.near_distance,
            config.far_distance,
            config.samples_per_length,
        );
        let channel = BeaconChannel::new(config.seed.wrapping_add(1), model, &config);
        Ok(Self {
            config,
            tracker,
            path,
            channel,
        })
    }

    /// Runs the simulation, feeding every channel event to the tracker.
    ///
    /// # Returns
    /// A [`SimReport`] when the run finishes within tolerance.
    ///
    /// # Errors
    /// - [`SimError::LapCountDecreased`] - the tracker lost laps mid-run
    /// - [`SimError::LapCountMismatch`] - the final count is off by more than the tolerance
    pub fn run(&mut self) -> Result<SimReport, SimError> {
        let mut report = SimReport::default();
        let mut zone = self.tracker.zone();

        for sample in 0..self.config.num_samples {
            let Some(distance) = self.path.next() else {
                break;
            };
            report.samples += 1;
            let before = self.tracker.lap_count();

            match self.channel.tick(distance) {
                None => {}
                Some(LinkEvent::Connected) => {
                    let kind = self.tracker.on_connected();
                    if kind != ConnectionKind::AlreadyConnected {
                        report.connections += 1;
                    }
                    info!(sample, ?kind, "beacon connected");
                }
                Some(LinkEvent::Disconnected) => {
                    self.tracker.on_disconnected();
                    report.disconnects += 1;
                    info!(sample, laps = self.tracker.lap_count(), "beacon disconnected");
                }
                Some(LinkEvent::Sample(rssi)) => match self.tracker.push_sample(rssi) {
                    SampleOutcome::Processed(reading) => {
                        report.processed += 1;
                        trace!(sample, rssi, distance = reading.distance, "sample");
                    }
                    SampleOutcome::LinkStalled { stuck_rssi } => {
                        report.stalls += 1;
                        warn!(sample, stuck_rssi, "link stalled");
                    }
                    SampleOutcome::Ignored(reason) => {
                        report.ignored += 1;
                        trace!(sample, rssi, ?reason, "sample ignored");
                    }
                },
            }

            let after = self.tracker.lap_count();
            if after < before {
                return Err(SimError::LapCountDecreased {
                    sample,
                    before,
                    after,
                });
            }
            if self.tracker.zone() != zone {
                let next = self.tracker.zone();
                debug!(
                    sample,
                    from = %zone,
                    to = %next,
                    laps = after,
                    true_distance = distance,
                    "zone changed"
                );
                zone = next;
            }
        }

        report.round_trips = self.path.round_trips();
        report.expected_count = report
            .round_trips
            .saturating_mul(self.config.tracker.lap_increment);
        report.final_count = self.tracker.lap_count();

        if report.final_count.abs_diff(report.expected_count) > self.config.lap_tolerance {
            return Err(SimError::LapCountMismatch {
                expected: report.expected_count,
                actual: report.final_count,
                tolerance: self.config.lap_tolerance,
            });
        }
        Ok(report)
    }

    pub fn tracker(&self) -> &DistanceTracker {
        &self.tracker
    }
}
