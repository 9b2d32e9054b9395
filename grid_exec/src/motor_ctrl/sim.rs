//! Simulated motor
//!
//! Integrates the commanded acceleration with the kinematics functions instead
//! of driving any hardware. The motor either follows wall time, advancing
//! whenever it is read or commanded, or is stepped explicitly with
//! [`SimMotor::advance`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Instant;

use log::{debug, warn};
use parking_lot::Mutex;

use super::{Motor, MotorError, MotorFactory};
use crate::{grid::TrackId, kinematics::Limits};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct SimMotor {
    limits: Limits,
    state: Mutex<SimState>,
}

/// Creates [`SimMotor`]s.
#[derive(Debug, Clone)]
pub struct SimMotorFactory {
    limits: Limits,
    realtime: bool,
}

#[derive(Debug)]
struct SimState {
    position_m: f64,
    velocity_ms: f64,
    acceleration_mss: f64,

    /// Time the state was last integrated to, `None` for a stepped motor.
    last_update: Option<Instant>,

    halted: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimMotor {
    /// A motor which follows wall time.
    pub fn new(limits: Limits) -> Self {
        Self::with_clock(limits, Some(Instant::now()))
    }

    /// A motor which only moves when [`SimMotor::advance`] is called.
    pub fn stepped(limits: Limits) -> Self {
        Self::with_clock(limits, None)
    }

    fn with_clock(limits: Limits, last_update: Option<Instant>) -> Self {
        Self {
            limits,
            state: Mutex::new(SimState {
                position_m: 0.0,
                velocity_ms: 0.0,
                acceleration_mss: 0.0,
                last_update,
                halted: false,
            }),
        }
    }

    /// Move the simulation forward by `dt_s` seconds.
    pub fn advance(&self, dt_s: f64) {
        let mut state = self.state.lock();
        state.integrate(&self.limits, dt_s);
    }

    /// Bring a wall time motor up to date and lock its state.
    fn current(&self) -> parking_lot::MutexGuard<SimState> {
        let mut state = self.state.lock();

        if let Some(last) = state.last_update {
            let now = Instant::now();
            state.last_update = Some(now);
            state.integrate(&self.limits, (now - last).as_secs_f64());
        }

        state
    }
}

impl SimState {
    fn integrate(&mut self, limits: &Limits, dt_s: f64) {
        if self.halted || !(dt_s > 0.0) {
            return;
        }

        let (vel, acc) = (self.velocity_ms, self.acceleration_mss);

        // Stopped and not pushed forwards, vehicles never reverse
        if vel <= 0.0 && acc <= 0.0 {
            self.velocity_ms = 0.0;
            return;
        }

        self.position_m += limits.position_after(vel, acc, dt_s);
        self.velocity_ms = limits.forward_velocity(vel, acc, dt_s).unwrap_or(0.0);
    }
}

impl Motor for SimMotor {
    fn set_acceleration(&self, acc_mss: f64) {
        let mut state = self.current();

        if state.halted {
            warn!("Simulated motor is halted, ignoring acceleration command");
            return;
        }

        state.acceleration_mss = acc_mss;
    }

    fn position(&self) -> f64 {
        self.current().position_m
    }

    fn velocity(&self) -> f64 {
        self.current().velocity_ms
    }

    fn acceleration(&self) -> f64 {
        self.current().acceleration_mss
    }

    fn calibrate(&self, position_m: f64) {
        self.current().position_m = position_m;
    }

    fn halt(&self) {
        let mut state = self.current();

        if !state.halted {
            debug!("Simulated motor halted at {:.4} m", state.position_m);
        }

        state.halted = true;
        state.velocity_ms = 0.0;
        state.acceleration_mss = 0.0;
    }
}

impl SimMotorFactory {
    /// Factory for wall time motors.
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            realtime: true,
        }
    }

    /// Factory for motors that are advanced explicitly.
    pub fn stepped(limits: Limits) -> Self {
        Self {
            limits,
            realtime: false,
        }
    }
}

impl MotorFactory for SimMotorFactory {
    fn create(&self, track_id: TrackId) -> Result<Box<dyn Motor>, MotorError> {
        debug!("Creating simulated motor for track {}", track_id);

        Ok(Box::new(match self.realtime {
            true => SimMotor::new(self.limits),
            false => SimMotor::stepped(self.limits),
        }))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
