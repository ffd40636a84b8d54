//! lapcount deterministic simulator CLI.
//!
//! Three modes:
//! - Fuzz: run many simulations with randomized swim geometry and channel impairments.
//! - Replay: re-run the scenario generated from one fuzz seed.
//! - Stress: one long session on a noisy, dropping channel.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use clap::Parser;
use lapcount::TrackerConfig;
use lapcount_sim::{LapSimulator, SimConfig, SimError, load_tracker_config};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "lapcount deterministic simulator", long_about = None)]
struct CliArgs {
    /// Run mode: fuzz, replay, or stress.
    #[arg(value_enum)]
    mode: RunMode,

    /// Seed for the simulation. Required for 'replay', master seed for 'fuzz' if provided.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of iterations (distinct scenario seeds) for 'fuzz' mode.
    #[arg(short = 'i', long, default_value_t = 1000)]
    iterations: usize,

    /// Number of RSSI polls per simulation run.
    #[arg(short = 'n', long, default_value_t = 2000)]
    samples: usize,

    /// Maximum RSSI noise half-width (dBm) for fuzz mode.
    #[arg(long, default_value_t = 3.0)]
    max_noise: f64,

    /// JSON file with a tracker configuration. Missing fields take their defaults.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Output file for logging failures.
    #[arg(short = 'o', long, default_value = "lapcount_sim_failures.log")]
    output_file: PathBuf,

    /// Number of parallel workers for fuzzing. Defaults to number of logical CPUs.
    #[arg(short = 'w', long, default_value_t = num_cpus::get())]
    workers: usize,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum RunMode {
    /// Fuzz with many random scenarios.
    Fuzz,
    /// Replay the scenario generated from a specific seed.
    Replay,
    /// Long-running session on an impaired channel.
    Stress,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = CliArgs::parse();

    let tracker = match args.config.as_deref().map(load_tracker_config) {
        None => TrackerConfig::default(),
        Some(Ok(tracker)) => tracker,
        Some(Err(e)) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    match args.mode {
        RunMode::Fuzz => run_fuzz_mode(&args, &tracker),
        RunMode::Replay => run_replay_mode(&args, &tracker),
        RunMode::Stress => run_stress_mode(&args, &tracker),
    }
}

/// Generates a randomized `SimConfig` for a fuzzing iteration.
///
/// # Parameters
/// - `iteration_seed`: Seed the whole scenario is derived from
/// - `num_samples`: Polls per run
/// - `max_noise`: Upper bound for the RSSI noise half-width
/// - `tracker`: Tracker configuration shared by every scenario
///
/// # Configuration Randomization
/// - **Geometry**: near end 0.3-1.0 m, far end 5-15 m, 15-60 samples per length
/// - **Noise**: 30% chance of none, otherwise up to `max_noise`
/// - **Null readings**: 70% chance of none, otherwise up to 5%
/// - **Dropouts**: 50% chance of unlimited range, otherwise somewhere past 60% of the far end
/// - **Stuck readings / reconnect delay**: 0-20 and 0-10 samples
fn generate_fuzz_config(
    iteration_seed: u64,
    num_samples: usize,
    max_noise: f64,
    tracker: &TrackerConfig,
) -> SimConfig {
    let mut rng = StdRng::seed_from_u64(iteration_seed);
    let far_distance = rng.random_range(5.0..=15.0);

    SimConfig {
        seed: rng.random(),
        num_samples,
        near_distance: rng.random_range(0.3..=1.0),
        far_distance,
        samples_per_length: rng.random_range(15..=60),
        rssi_noise: if rng.random_bool(0.3) {
            0.0
        } else {
            rng.random_range(0.0..=max_noise.max(0.0))
        },
        null_reading_probability: if rng.random_bool(0.7) {
            0.0
        } else {
            rng.random_range(0.0..=0.05)
        },
        dropout_distance: if rng.random_bool(0.5) {
            None
        } else {
            Some(rng.random_range((far_distance * 0.6)..=far_distance))
        },
        stuck_samples: rng.random_range(0..=20),
        reconnect_delay: rng.random_range(0..=10),
        lap_tolerance: tracker.lap_increment,
        tracker: tracker.clone(),
    }
}

/// Whether `error` is a bug rather than an expected miscount on an impaired channel.
///
/// Lap counts must never decrease. Miscounts are only tolerated when the
/// channel adds noise, null readings or dropouts.
fn is_critical(error: &SimError, config: &SimConfig) -> bool {
    match error {
        SimError::LapCountMismatch { .. } => config.is_ideal_channel(),
        SimError::LapCountDecreased { .. }
        | SimError::InvalidConfig { .. }
        | SimError::Tracker(_)
        | SimError::ConfigRead { .. }
        | SimError::ConfigParse { .. } => true,
    }
}

fn run_simulation(config: &SimConfig) -> Result<lapcount_sim::SimReport, SimError> {
    LapSimulator::new(config.clone())?.run()
}

/// Runs many randomized scenarios in parallel.
///
/// Scenario seeds are drawn up front from the master seed, so a failure log
/// entry can always be replayed regardless of worker scheduling. Ctrl+C stops
/// workers from picking up new scenarios.
fn run_fuzz_mode(args: &CliArgs, tracker: &TrackerConfig) {
    println!(
        "Starting Fuzz mode: {} iterations, {} samples/iter, noise up to {} dBm, {} workers.",
        args.iterations, args.samples, args.max_noise, args.workers
    );
    let fuzz_run_start_time = Instant::now();

    let completed = AtomicUsize::new(0);
    let critical_failures = AtomicUsize::new(0);
    let tolerated_errors = AtomicUsize::new(0);

    let output_file = match File::create(&args.output_file) {
        Ok(file) => Mutex::new(file),
        Err(e) => {
            error!("failed to create {}: {}", args.output_file.display(), e);
            std::process::exit(2);
        }
    };

    let running = std::sync::Arc::new(AtomicBool::new(true));
    let running_ctrlc = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("\nCtrl+C detected. Signalling workers to stop...");
        running_ctrlc.store(false, Ordering::SeqCst);
    }) {
        warn!("failed to install Ctrl+C handler: {}", e);
    }

    let master_fuzz_seed = args.seed.unwrap_or_else(rand::random);
    println!("Master seed for generating scenario seeds: {}", master_fuzz_seed);
    let mut seed_rng = StdRng::seed_from_u64(master_fuzz_seed);
    let scenario_seeds: Vec<u64> = (0..args.iterations).map(|_| seed_rng.random()).collect();

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers.max(1))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("failed to build worker pool: {}", e);
            std::process::exit(2);
        }
    };

    pool.install(|| {
        scenario_seeds.par_iter().for_each(|&scenario_seed| {
            if !running.load(Ordering::Relaxed) {
                return;
            }
            let config = generate_fuzz_config(scenario_seed, args.samples, args.max_noise, tracker);

            if let Err(sim_error) = run_simulation(&config) {
                let critical = is_critical(&sim_error, &config);
                let log_message = format!(
                    "[{}] {} - Seed {}: {}\nConfig: {:#?}\n\n",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    if critical {
                        "CRITICAL FAILURE"
                    } else {
                        "Tolerated Error"
                    },
                    scenario_seed,
                    sim_error,
                    config
                );

                if critical {
                    error!(scenario_seed, %sim_error, "critical failure");
                    critical_failures.fetch_add(1, Ordering::Relaxed);
                } else {
                    warn!(scenario_seed, %sim_error, "tolerated error");
                    tolerated_errors.fetch_add(1, Ordering::Relaxed);
                }
                if let Ok(mut file) = output_file.lock() {
                    let _ = file.write_all(log_message.as_bytes());
                    let _ = file.flush();
                }
            }

            let total_done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if total_done % 1000 == 0 || total_done == args.iterations {
                println!(
                    "Progress: {}/{} iterations completed ({} critical, {} tolerated)",
                    total_done,
                    args.iterations,
                    critical_failures.load(Ordering::Relaxed),
                    tolerated_errors.load(Ordering::Relaxed)
                );
            }
        });
    });

    let final_completed = completed.load(Ordering::SeqCst);
    let final_critical_failures = critical_failures.load(Ordering::SeqCst);

    println!("\n--- Fuzzing Run Summary ---");
    println!(
        "Total iterations attempted/completed: {} / {}",
        args.iterations, final_completed
    );
    println!("Duration: {:.2?}", fuzz_run_start_time.elapsed());
    println!("Critical Failures: {}", final_critical_failures);
    println!(
        "Tolerated Errors: {}",
        tolerated_errors.load(Ordering::SeqCst)
    );
    if !running.load(Ordering::SeqCst) {
        println!("Fuzzing was gracefully interrupted.");
    }
    if final_critical_failures > 0 {
        println!(
            "FAIL: Critical failures found. Check '{}'.",
            args.output_file.display()
        );
        std::process::exit(1);
    } else {
        println!("PASS: No critical failures detected.");
    }
}

/// Re-runs the scenario a fuzz seed generates and prints its report.
fn run_replay_mode(args: &CliArgs, tracker: &TrackerConfig) {
    let Some(seed_to_replay) = args.seed else {
        error!("--seed <VALUE> is required for replay mode");
        std::process::exit(2);
    };
    println!("Replaying scenario seed: {}", seed_to_replay);

    let config = generate_fuzz_config(seed_to_replay, args.samples, args.max_noise, tracker);
    println!("Replaying with Config: {:#?}", config);

    match run_simulation(&config) {
        Ok(report) => println!(
            "SUCCESS: Replay of seed {} completed: {}",
            seed_to_replay, report
        ),
        Err(e) => {
            eprintln!("FAILURE: Replay of seed {} failed: {}", seed_to_replay, e);
            std::process::exit(1);
        }
    }
}

/// Runs one long session with noise, null readings and dropouts at the far end.
///
/// Uses `iterations` as the number of round trips so the session length can
/// be scaled from the command line. Only a decreasing lap count fails the run;
/// the final miscount is reported.
fn run_stress_mode(args: &CliArgs, tracker: &TrackerConfig) {
    let seed = args.seed.unwrap_or_else(rand::random);
    let base = SimConfig::default();
    let round_trips = args.iterations.max(100);
    let config = SimConfig {
        seed,
        num_samples: round_trips * 2 * base.samples_per_length + 1,
        rssi_noise: 2.0,
        null_reading_probability: 0.01,
        dropout_distance: Some(base.far_distance * 0.8),
        stuck_samples: 12,
        reconnect_delay: 3,
        lap_tolerance: u32::MAX,
        tracker: tracker.clone(),
        ..base
    };

    println!("Running stress session with config: {:#?}", config);
    let start_time = Instant::now();
    match run_simulation(&config) {
        Ok(report) => {
            let error = report.final_count.abs_diff(report.expected_count);
            println!(
                "Stress session completed in {:.2?}: {} (miscount {})",
                start_time.elapsed(),
                report,
                error
            );
        }
        Err(e) => {
            eprintln!(
                "Stress session FAILED after {:.2?} with error: {}",
                start_time.elapsed(),
                e
            );
            eprintln!("Failing Config: {:#?}", config);
            std::process::exit(1);
        }
    }
}
