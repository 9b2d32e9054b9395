//! # Kinematics
//!
//! Closed form relationships between displacement, velocity, acceleration and
//! time for a vehicle moving forwards along a track. Motion is bounded by a
//! velocity cap and an acceleration range, held in [`Limits`].
//!
//! Every other part of the crate that needs to reason about motion goes
//! through these functions rather than deriving its own equations.
//!
//! Out of range results are handled in one of two ways:
//! - Constraint violations (an acceleration outside the bounds, a velocity
//!   below zero) are clamped and a warning is logged.
//! - Displacements which cannot be reached at all are reported as a
//!   [`KinematicsError`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::{Deserialize, Serialize};
use util::maths::{clamp_flagged, Limited};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default maximum velocity of a vehicle.
///
/// Units: meters/second
pub const MAX_VEL_MS: f64 = 0.5;

/// Default maximum acceleration of a vehicle.
///
/// Units: meters/second^2
pub const MAX_ACC_MSS: f64 = 3.0;

/// Default minimum (most negative) acceleration of a vehicle.
///
/// Units: meters/second^2
pub const MIN_ACC_MSS: f64 = -3.0;

/// Default velocity a vehicle should be at when it reaches the end of the
/// usable track and turns.
///
/// Units: meters/second
pub const TURN_VEL_MS: f64 = 0.3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Physical limits on the motion of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Velocity cap.
    ///
    /// Units: meters/second
    pub max_vel_ms: f64,

    /// Maximum acceleration.
    ///
    /// Units: meters/second^2
    pub max_acc_mss: f64,

    /// Minimum acceleration, i.e. the hardest braking possible.
    ///
    /// Units: meters/second^2
    pub min_acc_mss: f64,

    /// Velocity floor used when braking towards the end of a track.
    ///
    /// Units: meters/second
    pub turn_vel_ms: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors from kinematic calculations.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum KinematicsError {
    #[error(
        "Unreachable displacement: cannot cover {disp_m} m starting at {vel_ms} m/s with an \
        acceleration of {acc_mss} m/s^2"
    )]
    Unreachable {
        disp_m: f64,
        vel_ms: f64,
        acc_mss: f64,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_vel_ms: MAX_VEL_MS,
            max_acc_mss: MAX_ACC_MSS,
            min_acc_mss: MIN_ACC_MSS,
            turn_vel_ms: TURN_VEL_MS,
        }
    }
}

impl Limits {
    /// Velocity after accelerating for `time_s`, capped at the maximum
    /// velocity.
    ///
    /// A result below zero would mean reversing, which is not possible, so it
    /// is logged and clamped to zero.
    pub fn velocity_after(&self, vel_ms: f64, acc_mss: f64, time_s: f64) -> f64 {
        match self.forward_velocity(vel_ms, acc_mss, time_s) {
            Some(vel) => vel,
            None => {
                let vel = vel_ms + acc_mss * time_s;
                if vel < 0.0 {
                    warn!(
                        "Velocity {:.6} m/s is below zero ({} m/s at {} m/s^2 for {} s), \
                        clamping",
                        vel, vel_ms, acc_mss, time_s
                    );
                }
                0.0
            }
        }
    }

    /// Velocity after accelerating for `time_s`, capped at the maximum
    /// velocity, or `None` if the vehicle has come to a stop.
    ///
    /// Stopping is an expected outcome for a motor being braked, so unlike
    /// [`Limits::velocity_after`] nothing is logged.
    pub fn forward_velocity(&self, vel_ms: f64, acc_mss: f64, time_s: f64) -> Option<f64> {
        let vel = vel_ms + acc_mss * time_s;

        match vel > 0.0 {
            true => Some(vel.min(self.max_vel_ms)),
            false => None,
        }
    }

    /// Distance covered before coming to a stop when holding `acc_mss` from
    /// `vel_ms`. Infinite if the vehicle never stops.
    ///
    /// Units: meters
    pub fn stopping_distance(&self, vel_ms: f64, acc_mss: f64) -> f64 {
        if vel_ms <= 0.0 {
            0.0
        }
        else if acc_mss >= 0.0 {
            std::f64::INFINITY
        }
        else {
            vel_ms.powi(2) / (-2.0 * acc_mss)
        }
    }

    /// Constant acceleration required to cover `disp_m` in exactly `time_s`
    /// starting at `vel_ms`, clamped to the acceleration bounds.
    ///
    /// Solves `disp = v0*t + 0.5*a*t^2` for `a`. Callers must accept that the
    /// clamped solution may arrive later (or earlier) than requested.
    pub fn acceleration_for(&self, disp_m: f64, vel_ms: f64, time_s: f64) -> f64 {
        if time_s.is_infinite() && time_s > 0.0 {
            // Arriving at some unbounded time in the future is the same as
            // holding the current state
            warn!("Acceleration requested over an infinite time, holding velocity");
            return self.clamp_acc(0.0);
        }
        if !(time_s > 0.0) {
            warn!(
                "Acceleration requested over non-positive time {} s, using maximum",
                time_s
            );
            return self.max_acc_mss;
        }

        let acc = 2.0 * (disp_m - vel_ms * time_s) / time_s.powi(2);

        self.clamp_acc(acc)
    }

    /// Displacement after accelerating for `time_s` starting at `vel_ms`.
    ///
    /// If the velocity would exceed the cap during this time the motion is
    /// split into an accelerating phase followed by a constant velocity phase
    /// at the cap. If the velocity would drop below zero the vehicle is taken
    /// to stop and stay where it stopped.
    pub fn position_after(&self, vel_ms: f64, acc_mss: f64, time_s: f64) -> f64 {
        let raw_vel = vel_ms + acc_mss * time_s;

        if raw_vel > self.max_vel_ms && acc_mss > 0.0 {
            // Time taken and distance covered reaching the cap
            let time_to_max_vel = ((self.max_vel_ms - vel_ms) / acc_mss).max(0.0);
            let disp_to_max_vel =
                vel_ms * time_to_max_vel + 0.5 * acc_mss * time_to_max_vel.powi(2);

            disp_to_max_vel + self.max_vel_ms * (time_s - time_to_max_vel)
        }
        else if raw_vel < 0.0 && acc_mss < 0.0 {
            let time_to_stop = -vel_ms / acc_mss;

            vel_ms * time_to_stop + 0.5 * acc_mss * time_to_stop.powi(2)
        }
        else {
            vel_ms * time_s + 0.5 * acc_mss * time_s.powi(2)
        }
    }

    /// Time taken to cover `disp_m` starting at `vel_ms` with constant
    /// acceleration `acc_mss`, respecting the velocity cap.
    ///
    /// Returns `KinematicsError::Unreachable` if the vehicle stops (or is
    /// already stopped) before covering the displacement, or if the
    /// displacement is behind the vehicle.
    pub fn time_to_cover(
        &self,
        disp_m: f64,
        vel_ms: f64,
        acc_mss: f64,
    ) -> Result<f64, KinematicsError> {
        let unreachable = KinematicsError::Unreachable {
            disp_m,
            vel_ms,
            acc_mss,
        };

        if disp_m == 0.0 {
            return Ok(0.0);
        }
        if disp_m < 0.0 {
            return Err(unreachable);
        }

        // No acceleration, constant velocity
        if acc_mss == 0.0 {
            return match vel_ms > 0.0 {
                true => Ok(disp_m / vel_ms),
                false => Err(unreachable),
            };
        }

        let discriminant = vel_ms.powi(2) + 2.0 * acc_mss * disp_m;
        if discriminant < 0.0 {
            return Err(unreachable);
        }

        let final_vel = discriminant.sqrt();

        if final_vel <= self.max_vel_ms || acc_mss < 0.0 {
            Ok((final_vel - vel_ms) / acc_mss)
        }
        else {
            // Time taken and distance covered reaching the cap, then the rest
            // is covered at the cap
            let time_to_max_vel = ((self.max_vel_ms - vel_ms) / acc_mss).max(0.0);
            let disp_to_max_vel =
                vel_ms * time_to_max_vel + 0.5 * acc_mss * time_to_max_vel.powi(2);

            Ok(time_to_max_vel + (disp_m - disp_to_max_vel) / self.max_vel_ms)
        }
    }

    /// Constant acceleration which takes a vehicle from `vel_ms` to
    /// `target_vel_ms` over `disp_m`, clamped to the acceleration bounds.
    pub fn acceleration_to_reach(&self, vel_ms: f64, target_vel_ms: f64, disp_m: f64) -> f64 {
        if !(disp_m > 0.0) {
            warn!(
                "Cannot change velocity from {} m/s to {} m/s over {} m",
                vel_ms, target_vel_ms, disp_m
            );
            return if target_vel_ms < vel_ms {
                self.min_acc_mss
            }
            else if target_vel_ms > vel_ms {
                self.max_acc_mss
            }
            else {
                0.0
            };
        }

        self.clamp_acc((target_vel_ms.powi(2) - vel_ms.powi(2)) / (2.0 * disp_m))
    }

    /// Clamp an acceleration into the bounds, warning if it was outside them.
    pub fn clamp_acc(&self, acc_mss: f64) -> f64 {
        let (acc, limited) = clamp_flagged(&acc_mss, &self.min_acc_mss, &self.max_acc_mss);

        match limited {
            Limited::Min => warn!(
                "Acceleration {:.4} m/s^2 was below minimum! Trying to decelerate too fast",
                acc_mss
            ),
            Limited::Max => warn!(
                "Acceleration {:.4} m/s^2 was above maximum! Trying to accelerate too fast",
                acc_mss
            ),
            Limited::No => (),
        }

        acc
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
