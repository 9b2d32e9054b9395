//! Stepper motor driven by a variable period pulse train.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    collections::HashMap,
    sync::{
        mpsc::{channel, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
};

use hw_if::{Level, PinDriver, PinMode};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use super::{
    worker::{MotorState, Worker, WorkerSignal},
    Motor, MotorError, MotorFactory, MotorParams,
};
use crate::{grid::TrackId, kinematics::Limits};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A motor which realises its target acceleration by pulsing a step pin.
///
/// Pulses are produced on a worker thread which sleeps while the motor is
/// stopped. Dropping the motor halts and joins the worker.
pub struct PulseMotor {
    pin: u8,
    params: MotorParams,
    state: Arc<Mutex<MotorState>>,
    sender: Mutex<Sender<WorkerSignal>>,
    worker_jh: Mutex<Option<JoinHandle<()>>>,
}

/// Creates [`PulseMotor`]s on a shared pin driver.
pub struct PulseMotorFactory {
    driver: Arc<dyn PinDriver>,
    pins: HashMap<TrackId, u8>,
    params: MotorParams,
    limits: Limits,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PulseMotor {
    /// Configure `pin` as an output and start the motor's worker.
    pub fn new(
        pin: u8,
        driver: Arc<dyn PinDriver>,
        params: MotorParams,
        limits: Limits,
    ) -> Result<Self, MotorError> {
        params.are_valid()?;

        driver.pin_mode(pin, PinMode::Output)?;
        driver.digital_write(pin, Level::Low)?;

        let state = Arc::new(Mutex::new(MotorState::new()));
        let (sender, receiver) = channel();

        let worker = Worker {
            pin,
            params,
            limits,
            state: state.clone(),
            driver,
            receiver,
        };

        let worker_jh = thread::Builder::new()
            .name(format!("motor_{}", pin))
            .spawn(move || worker.run())
            .map_err(MotorError::CannotStartWorker)?;

        debug!("PulseMotor on pin {} initialised", pin);

        Ok(Self {
            pin,
            params,
            state,
            sender: Mutex::new(sender),
            worker_jh: Mutex::new(Some(worker_jh)),
        })
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    fn wake(&self) {
        // The worker only goes away after a halt, in which case there is
        // nothing left to wake
        self.sender.lock().send(WorkerSignal::Wake).ok();
    }
}

impl Motor for PulseMotor {
    fn set_acceleration(&self, acc_mss: f64) {
        if self.worker_jh.lock().is_none() {
            warn!("Motor on pin {} is halted, ignoring acceleration command", self.pin);
            return;
        }

        {
            let mut state = self.state.lock();
            state.acceleration_mss = acc_mss;

            // A stopped motor needs a first pulse to get going
            if state.is_stopped() && acc_mss > 0.0 {
                state.half_period_us = self.params.stop_half_period_us;
            }
        }

        self.wake();
    }

    fn position(&self) -> f64 {
        self.state.lock().position_m
    }

    fn velocity(&self) -> f64 {
        self.params.velocity_for(self.state.lock().half_period_us)
    }

    fn acceleration(&self) -> f64 {
        self.state.lock().acceleration_mss
    }

    fn calibrate(&self, position_m: f64) {
        self.state.lock().position_m = position_m;
    }

    fn halt(&self) {
        let worker_jh = match self.worker_jh.lock().take() {
            Some(jh) => jh,
            None => return,
        };

        self.sender.lock().send(WorkerSignal::Halt).ok();

        if worker_jh.join().is_err() {
            error!("Motor worker on pin {} panicked", self.pin);
        }

        self.state.lock().stop();
    }
}

impl Drop for PulseMotor {
    fn drop(&mut self) {
        self.halt();
    }
}

impl PulseMotorFactory {
    pub fn new(
        driver: Arc<dyn PinDriver>,
        pins: HashMap<TrackId, u8>,
        params: MotorParams,
        limits: Limits,
    ) -> Self {
        Self {
            driver,
            pins,
            params,
            limits,
        }
    }
}

impl MotorFactory for PulseMotorFactory {
    fn create(&self, track_id: TrackId) -> Result<Box<dyn Motor>, MotorError> {
        let pin = *self
            .pins
            .get(&track_id)
            .ok_or(MotorError::NoPinForTrack(track_id))?;

        info!("Creating motor for track {} on pin {}", track_id, pin);

        Ok(Box::new(PulseMotor::new(
            pin,
            self.driver.clone(),
            self.params,
            self.limits,
        )?))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
