//! Parameters structure for motor control

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::MotorError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the stepper motors driving the tracks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorParams {
    /// Radius of the drive wheel.
    ///
    /// Units: meters
    pub wheel_radius_m: f64,

    /// Number of pulses for one full revolution of the drive wheel.
    pub pulses_per_rev: u32,

    /// Half period above which the motor is considered stopped. A motor
    /// starting from rest begins pulsing at this half period.
    ///
    /// Units: microseconds
    pub stop_half_period_us: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for MotorParams {
    fn default() -> Self {
        Self {
            wheel_radius_m: 0.075,
            pulses_per_rev: 200,
            stop_half_period_us: 10_000.0,
        }
    }
}

impl MotorParams {
    /// Check the parameters describe a physical motor.
    pub fn are_valid(&self) -> Result<(), MotorError> {
        if !(self.wheel_radius_m > 0.0) {
            return Err(MotorError::InvalidParams(format!(
                "wheel radius must be positive, got {}",
                self.wheel_radius_m
            )));
        }
        if self.pulses_per_rev == 0 {
            return Err(MotorError::InvalidParams(
                "pulses per revolution must be non-zero".into(),
            ));
        }
        if !(self.stop_half_period_us > 0.0) || !self.stop_half_period_us.is_finite() {
            return Err(MotorError::InvalidParams(format!(
                "stop half period must be positive and finite, got {}",
                self.stop_half_period_us
            )));
        }

        Ok(())
    }

    /// Angle the wheel turns through per pulse.
    ///
    /// Units: radians
    pub fn rad_per_pulse(&self) -> f64 {
        2.0 * PI / self.pulses_per_rev as f64
    }

    /// Distance travelled along the track per pulse.
    ///
    /// Units: meters
    pub fn step_m(&self) -> f64 {
        self.wheel_radius_m * self.rad_per_pulse()
    }

    /// Half period that realises the given velocity, infinite for a stopped
    /// motor.
    ///
    /// Units: microseconds
    pub fn half_period_for(&self, vel_ms: f64) -> f64 {
        if vel_ms > 0.0 {
            self.step_m() / (2.0 * vel_ms) * 1e6
        }
        else {
            std::f64::INFINITY
        }
    }

    /// Velocity realised by pulsing with the given half period.
    ///
    /// Units: meters/second
    pub fn velocity_for(&self, half_period_us: f64) -> f64 {
        if half_period_us.is_finite() && half_period_us > 0.0 {
            self.step_m() / (2.0 * half_period_us * 1e-6)
        }
        else {
            0.0
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
    fn test_step_and_period() {
        let p = MotorParams::default();

        assert_approx_eq!(p.rad_per_pulse(), PI / 100.0);
        assert_approx_eq!(p.step_m(), 0.075 * PI / 100.0);

        let half = p.half_period_for(0.25);
        assert_approx_eq!(p.velocity_for(half), 0.25);

        assert!(p.half_period_for(0.0).is_infinite());
        assert_eq!(p.velocity_for(std::f64::INFINITY), 0.0);
    }

    #[test]
    fn test_are_valid() {
        assert!(MotorParams::default().are_valid().is_ok());

        let p = MotorParams {
            pulses_per_rev: 0,
            ..Default::default()
        };
        assert!(p.are_valid().is_err());

        let p = MotorParams {
            wheel_radius_m: -1.0,
            ..Default::default()
        };
        assert!(p.are_valid().is_err());
    }
}
