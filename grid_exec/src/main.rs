//! Main track grid executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the grid, creating one motor per occupied track
//!     - Main loop:
//!         - Plan the cycle and push the accelerations into the motors
//!         - Archive the state of every vehicle
//!         - Stop once every autonomous vehicle has left the usable track
//!     - Halt the motors and save the final state of the grid

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::{
    str::FromStr,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use structopt::StructOpt;

// Internal
use grid_lib::{
    grid::{AccelCommand, Grid, GridParams, TrackId, VehicleKind},
    motor_ctrl::{MotorFactory, PulseMotorFactory, SimMotorFactory},
    params::GridExecParams,
};
use hw_if::EmulatedPi;
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "grid_exec", about = "Plans and drives vehicles across the track grid")]
struct Opts {
    /// Grid parameter file, relative to the params directory
    #[structopt(long, default_value = "grid.toml")]
    grid_params: String,

    /// Executable parameter file, relative to the params directory
    #[structopt(long, default_value = "grid_exec.toml")]
    exec_params: String,

    /// Motor backend to drive: sim, emu or hw
    #[structopt(short, long, default_value = "sim")]
    backend: Backend,

    /// Stop after this many planning cycles
    #[structopt(short, long)]
    cycles: Option<u64>,

    /// Minimum level of messages to log (info, debug or trace)
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

/// One row of the cycle archive, per vehicle.
#[derive(Serialize)]
struct CycleRecord {
    cycle: u64,
    time_s: f64,
    track_id: TrackId,
    kind: VehicleKind,
    position_m: f64,
    velocity_ms: f64,
    acc_mss: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What the motors are driven by.
#[derive(Debug, Clone, Copy)]
enum Backend {
    /// Kinematic simulation, no pins
    Sim,

    /// Pulse trains into an emulated GPIO bank
    Emu,

    /// Pulse trains into the Raspberry Pi's GPIO
    Hw,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("grid_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Track Grid Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let grid_params: GridParams =
        util::params::load(&opts.grid_params).wrap_err("Could not load grid params")?;
    let exec_params: GridExecParams =
        util::params::load(&opts.exec_params).wrap_err("Could not load exec params")?;

    if !(exec_params.cycle_period_s > 0.0) {
        return Err(eyre!(
            "The cycle period must be positive, found {} s",
            exec_params.cycle_period_s
        ));
    }

    info!("Exec parameters loaded");

    // ---- INITIALISE GRID ----

    let factory = motor_factory(opts.backend, &grid_params)?;
    let mut grid = Grid::new(&grid_params, factory.as_ref()).wrap_err("Failed to build the grid")?;

    info!("Grid initialised with {:?} motors\n", opts.backend);

    let mut archiver =
        Archiver::from_path(&session, "cycles.csv").wrap_err("Failed to create the cycle archive")?;

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let mut num_cycles: u64 = 0;
    let mut num_consec_cycle_overruns: u64 = 0;

    loop {
        if let Some(max) = opts.cycles {
            if num_cycles >= max {
                info!("Reached the requested {} cycles", max);
                break;
            }
        }

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- PLANNING ----

        let commands = grid.step().wrap_err("Failed to plan the cycle")?;

        // ---- WRITE ARCHIVES ----

        archive_cycle(&mut archiver, &grid, &commands, num_cycles);

        if exec_params.snapshot_period_cycles > 0
            && num_cycles % exec_params.snapshot_period_cycles == 0
        {
            session.save(
                format!("snapshots/grid_{:06}.json", num_cycles),
                grid.snapshot(),
            );
        }

        if grid.is_finished() {
            info!("All autonomous vehicles have left the grid");
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                num_consec_cycle_overruns += 1;

                if num_consec_cycle_overruns > exec_params.max_consec_overruns {
                    grid.halt();
                    return Err(eyre!(
                        "More than {} consecutive cycle overruns",
                        exec_params.max_consec_overruns
                    ));
                }
            }
        }

        num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    grid.halt();
    session.save("grid_final.json", grid.snapshot());

    info!("End of execution after {} cycles", num_cycles);

    session.exit();

    Ok(())
}

/// Build the motor factory for the selected backend.
fn motor_factory(backend: Backend, params: &GridParams) -> Result<Box<dyn MotorFactory>, Report> {
    Ok(match backend {
        Backend::Sim => Box::new(SimMotorFactory::new(params.limits)),
        Backend::Emu => Box::new(PulseMotorFactory::new(
            Arc::new(EmulatedPi::new()),
            params.pins(),
            params.motor,
            params.limits,
        )),
        Backend::Hw => hw_factory(params)?,
    })
}

#[cfg(target_arch = "arm")]
fn hw_factory(params: &GridParams) -> Result<Box<dyn MotorFactory>, Report> {
    let gpio = hw_if::RaspiGpio::new().wrap_err("Failed to access the Raspberry Pi GPIO")?;

    Ok(Box::new(PulseMotorFactory::new(
        Arc::new(gpio),
        params.pins(),
        params.motor,
        params.limits,
    )))
}

#[cfg(not(target_arch = "arm"))]
fn hw_factory(_params: &GridParams) -> Result<Box<dyn MotorFactory>, Report> {
    Err(eyre!(
        "The hw backend is only available when built for the Raspberry Pi"
    ))
}

/// Write one record per vehicle into the cycle archive.
fn archive_cycle(archiver: &mut Archiver, grid: &Grid, commands: &[AccelCommand], cycle: u64) {
    let time_s = session::get_elapsed_seconds();

    for car in grid.cars() {
        let record = CycleRecord {
            cycle,
            time_s,
            track_id: car.track_id(),
            kind: car.kind(),
            position_m: car.position(),
            velocity_ms: car.velocity(),
            acc_mss: commands
                .iter()
                .find(|c| c.track_id == car.track_id())
                .map(|c| c.acc_mss),
        };

        if let Err(e) = archiver.serialise(record) {
            warn!("Could not archive track {}: {}", car.track_id(), e);
        }
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sim" => Ok(Backend::Sim),
            "emu" => Ok(Backend::Emu),
            "hw" => Ok(Backend::Hw),
            _ => Err(format!("Unknown backend \"{}\", expected sim, emu or hw", s)),
        }
    }
}
