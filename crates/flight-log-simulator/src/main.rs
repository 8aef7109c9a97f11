//! Desktop simulator for the flight-log data logger.
//!
//! Flies a synthetic rocket (boost, coast, descent) and logs its sensors
//! through `flight-log-core` into a host directory, the same way the flight
//! computer logs to its SD card.
//!
//! ```text
//! flight-log-simulator [OUTPUT_DIR] [SECONDS] [always|gate]
//! ```
//!
//! Run with `--help` for the defaults.
//!
//! Sensors run at their own cadences: IMU at 1 kHz, magnetometer at 100 Hz,
//! barometer and thermometer at 50 Hz. Set `RUST_LOG=debug` to see flushes.

mod medium;
mod sensors;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use log::{error, info, warn};

use flight_log_core::{Channel, EmitPolicy, FlightLogger, LoggerConfig, LoggerStatus, Tick};

use crate::medium::FsMedium;
use crate::sensors::{SyntheticFlight, pressure_to_altitude};

/// Simulated time step, one IMU sample
const STEP_US: Tick = 1_000;

/// Magnetometer sample every N steps (100 Hz)
const MAG_DIVIDER: u64 = 10;

/// Barometer and thermometer sample every N steps (50 Hz)
const BARO_DIVIDER: u64 = 20;

/// Emit policy as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// One record per loop iteration, reusing stale values
    Always,
    /// Only records where every channel has a fresh value
    Gate,
}

impl From<Policy> for EmitPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Always => EmitPolicy::AlwaysEmit,
            Policy::Gate => EmitPolicy::Gate,
        }
    }
}

/// Fly a synthetic rocket and log its sensors to a host directory.
#[derive(Debug, Parser)]
#[command(name = "flight-log-simulator", about)]
struct Cli {
    /// Directory that receives the session files.
    #[arg(default_value = "flight-logs")]
    output_dir: PathBuf,

    /// Simulated flight time in seconds.
    #[arg(default_value_t = 30)]
    seconds: u64,

    /// When a combined record is written.
    #[arg(value_enum, default_value_t = Policy::Always)]
    policy: Policy,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Cli::parse();
    let policy = EmitPolicy::from(args.policy);

    info!(
        "Simulating {} s of flight into {} ({:?})",
        args.seconds,
        args.output_dir.display(),
        policy
    );

    let medium = FsMedium::new(&args.output_dir);
    let monitor = medium.latency_monitor();

    let config = LoggerConfig::default().with_policy(policy);
    let mut logger: FlightLogger<FsMedium> = FlightLogger::new(config);
    if let Err(e) = logger.open(medium) {
        // Keep flying, as the flight computer would
        warn!("Continuing without logging: {}", e);
    }

    let mut flight = SyntheticFlight::new();
    let steps = args.seconds * 1_000_000 / STEP_US;
    let dt = STEP_US as f32 / 1_000_000.0;
    let wall_start = Instant::now();

    for step in 0..steps {
        let now = step * STEP_US;
        flight.step(dt);

        logger.observe(Channel::Accelerometer, flight.accelerometer());
        logger.observe(Channel::Gyroscope, flight.gyroscope());

        if step % MAG_DIVIDER == 0 {
            logger.observe(Channel::Magnetometer, flight.magnetometer());
        }

        if step % BARO_DIVIDER == 0 {
            let temperature = flight.temperature();
            let pressure = flight.pressure();
            logger.observe(Channel::Temperature, temperature);
            logger.observe(Channel::Pressure, pressure);
            logger.observe(
                Channel::Altitude,
                pressure_to_altitude(pressure, temperature),
            );
        }

        logger.try_emit(now);
        logger.tick(now);
    }

    info!(
        "Flight ended in {:?} phase at {:.1} m after {:.1} s",
        flight.phase(),
        flight.altitude(),
        flight.elapsed()
    );

    if let Err(e) = logger.close() {
        error!("Failed to close session: {}", e);
    }

    let stats = logger.stats();
    let latency = monitor.get();
    println!("session:         {}", logger.session_name().unwrap_or("-"));
    println!("status:          {:?}", logger.status());
    println!("records written: {}", stats.records_emitted);
    println!("records dropped: {}", stats.records_dropped);
    println!("bytes flushed:   {}", stats.bytes_flushed);
    println!("flushes / syncs: {} / {}", stats.flushes, stats.syncs);
    println!("worst write:     {:?}", latency.worst_write);
    println!("worst sync:      {:?}", latency.worst_sync);
    println!("time in medium:  {:?}", latency.total);
    println!("wall time:       {:?}", wall_start.elapsed());

    match logger.status() {
        LoggerStatus::Disabled(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
