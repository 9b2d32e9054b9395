//! # Motor Control
//!
//! Each track is driven by a single motor. A [`Motor`] accepts a target
//! acceleration and realises it, exposing the resulting position, velocity and
//! acceleration of the vehicle on its track.
//!
//! Two implementations are provided:
//! - [`PulseMotor`], which drives a stepper through a [`hw_if::PinDriver`]
//!   from a dedicated worker thread.
//! - [`SimMotor`], which integrates the commanded acceleration using the
//!   kinematics functions and touches no hardware.
//!
//! Motors are handed out by a [`MotorFactory`], so that the grid never needs
//! to know which kind it is driving.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod pulse;
mod sim;
mod worker;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use pulse::*;
pub use sim::*;

use crate::grid::TrackId;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A motor moving one vehicle along one track.
///
/// Motors are read by the planning thread while their own control loop may be
/// running, so every method takes `&self` and returns a snapshot.
pub trait Motor: Send + Sync {
    /// Set the target acceleration. Motion stays continuous, only the rate of
    /// change of velocity is altered.
    ///
    /// Units: meters/second^2
    fn set_acceleration(&self, acc_mss: f64);

    /// Add `delta_mss` to the current target acceleration.
    fn change_acceleration(&self, delta_mss: f64) {
        self.set_acceleration(self.acceleration() + delta_mss)
    }

    /// Distance travelled along the track.
    ///
    /// Units: meters
    fn position(&self) -> f64;

    /// Units: meters/second
    fn velocity(&self) -> f64;

    /// Units: meters/second^2
    fn acceleration(&self) -> f64;

    /// Reset the position without affecting velocity or acceleration.
    fn calibrate(&self, position_m: f64);

    /// Stop the motor permanently. Calling this more than once has no further
    /// effect.
    fn halt(&self);
}

/// Provides motors for tracks.
pub trait MotorFactory {
    /// Create the motor driving the given track.
    fn create(&self, track_id: TrackId) -> Result<Box<dyn Motor>, MotorError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while creating or running a motor.
#[derive(Debug, thiserror::Error)]
pub enum MotorError {
    #[error("Hardware error: {0}")]
    Hardware(#[from] hw_if::HwError),

    #[error("Could not start the motor worker thread: {0}")]
    CannotStartWorker(std::io::Error),

    #[error("No motor pin is configured for track {0}")]
    NoPinForTrack(TrackId),

    #[error("Invalid motor parameters: {0}")]
    InvalidParams(String),
}
