//! Pulse train worker thread for [`super::PulseMotor`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    sync::{
        mpsc::{Receiver, TryRecvError},
        Arc,
    },
    thread,
};

use hw_if::{Level, PinDriver};
use log::{debug, trace, warn};
use parking_lot::Mutex;
use util::time::micros_to_duration;

use super::MotorParams;
use crate::kinematics::Limits;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic state shared between a motor and its worker.
#[derive(Debug, Clone, Copy)]
pub(super) struct MotorState {
    /// Units: meters
    pub position_m: f64,

    /// Units: meters/second^2
    pub acceleration_mss: f64,

    /// Half of the current pulse period, infinite while stopped.
    ///
    /// Units: microseconds
    pub half_period_us: f64,
}

/// Everything the worker needs to drive one pin.
pub(super) struct Worker {
    pub pin: u8,
    pub params: MotorParams,
    pub limits: Limits,
    pub state: Arc<Mutex<MotorState>>,
    pub driver: Arc<dyn PinDriver>,
    pub receiver: Receiver<WorkerSignal>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(super) enum WorkerSignal {
    /// The target acceleration has changed
    Wake,

    /// The worker should stop permanently
    Halt,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotorState {
    pub fn new() -> Self {
        Self {
            position_m: 0.0,
            acceleration_mss: 0.0,
            half_period_us: std::f64::INFINITY,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.half_period_us.is_infinite()
    }

    pub fn stop(&mut self) {
        self.half_period_us = std::f64::INFINITY;
    }

    /// Account for one complete pulse and work out the half period of the
    /// next one.
    pub fn advance_pulse(&mut self, params: &MotorParams, limits: &Limits) {
        self.position_m += params.step_m();

        let vel_ms = params.velocity_for(self.half_period_us);
        let dt_s = 2.0 * self.half_period_us * 1e-6;

        let next_vel_ms = match limits.forward_velocity(vel_ms, self.acceleration_mss, dt_s) {
            Some(v) => v,
            None => {
                self.stop();
                return;
            }
        };
        let half_period_us = params.half_period_for(next_vel_ms);

        if half_period_us > params.stop_half_period_us {
            // Too slow to keep turning unless still speeding up
            if self.acceleration_mss > 0.0 {
                self.half_period_us = params.stop_half_period_us;
            }
            else {
                self.stop();
            }
        }
        else {
            self.half_period_us = half_period_us;
        }
    }
}

impl Worker {
    /// Run the worker until halted or until the owning motor is dropped.
    pub fn run(self) {
        debug!("Motor worker on pin {} started", self.pin);

        'idle: loop {
            // Block until there is a new command
            match self.receiver.recv() {
                Ok(WorkerSignal::Wake) => (),
                Ok(WorkerSignal::Halt) | Err(_) => break,
            }

            loop {
                let half_period_us = {
                    let state = self.state.lock();
                    if state.is_stopped() {
                        break;
                    }
                    state.half_period_us
                };

                if self.pulse(half_period_us) {
                    self.state.lock().advance_pulse(&self.params, &self.limits);
                }

                // Drain pending signals without blocking
                loop {
                    match self.receiver.try_recv() {
                        Ok(WorkerSignal::Wake) => continue,
                        Ok(WorkerSignal::Halt) | Err(TryRecvError::Disconnected) => break 'idle,
                        Err(TryRecvError::Empty) => break,
                    }
                }
            }

            trace!("Motor on pin {} stopped", self.pin);
        }

        // Leave the pin low once actuation is over
        if let Err(e) = self.driver.digital_write(self.pin, Level::Low) {
            warn!("Could not lower pin {} on halt: {}", self.pin, e);
        }

        debug!("Motor worker on pin {} halted", self.pin);
    }

    /// Emit one pulse, returning `false` if the hardware rejected it.
    ///
    /// The full period is held either way so the pulse timing is preserved.
    fn pulse(&self, half_period_us: f64) -> bool {
        let half = micros_to_duration(half_period_us);

        let high = self.driver.digital_write(self.pin, Level::High);
        thread::sleep(half);
        let low = self.driver.digital_write(self.pin, Level::Low);
        thread::sleep(half);

        match high.and(low) {
            Ok(()) => true,
            Err(e) => {
                warn!("Pulse on pin {} skipped: {}", self.pin, e);
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_advance_pulse_speeds_up() {
        let params = MotorParams::default();
        let limits = Limits::default();
        let mut state = MotorState::new();
        state.acceleration_mss = 3.0;
        state.half_period_us = params.stop_half_period_us;

        let mut last_vel = params.velocity_for(state.half_period_us);
        for i in 1..=50 {
            state.advance_pulse(&params, &limits);
            let vel = params.velocity_for(state.half_period_us);

            assert!(vel >= last_vel);
            assert!(vel <= limits.max_vel_ms + 1e-9);
            assert_approx_eq!(state.position_m, i as f64 * params.step_m());
            last_vel = vel;
        }
    }

    #[test]
    fn test_advance_pulse_stops() {
        let params = MotorParams::default();
        let limits = Limits::default();
        let mut state = MotorState::new();
        state.acceleration_mss = -3.0;
        state.half_period_us = params.half_period_for(0.2);

        let mut pulses = 0;
        while !state.is_stopped() {
            state.advance_pulse(&params, &limits);
            pulses += 1;
            assert!(pulses < 1000);
        }

        // Stopping from 0.2 m/s at 3 m/s^2 takes under 7 mm
        assert!(state.position_m < 0.007 + params.step_m());
    }

    #[test]
    fn test_advance_pulse_below_threshold() {
        let params = MotorParams::default();
        let limits = Limits::default();
        let mut state = MotorState::new();

        // Slowing down from the slowest speed stops the motor
        state.half_period_us = params.stop_half_period_us;
        state.acceleration_mss = -0.5;
        state.advance_pulse(&params, &limits);
        assert!(state.is_stopped());
    }
}
