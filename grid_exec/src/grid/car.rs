//! Vehicles travelling along the tracks

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::raise_error;

use super::{Axis, Intersection, TrackId, TrackParams, VehicleKind, VehicleParams, Window};
use crate::{
    kinematics::{KinematicsError, Limits},
    motor_ctrl::Motor,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A vehicle on a track, moved by that track's motor.
pub struct Car {
    track_id: TrackId,
    axis: Axis,
    length_m: f64,
    usable_length_m: f64,
    motor: Box<dyn Motor>,
    driver: Driver,
}

/// Planning state kept for an autonomous vehicle.
#[derive(Debug, Clone, Default)]
pub struct AutoState {
    /// Crossings considered in the last planning cycle, in the order they are
    /// reached.
    pub plan: Vec<PlannedCrossing>,

    /// Acceleration produced by the last planning cycle.
    ///
    /// Units: meters/second^2
    pub last_acc_mss: Option<f64>,
}

/// The outcome of planning one crossing for an autonomous vehicle.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedCrossing {
    pub across_id: TrackId,
    pub down_id: TrackId,

    /// Time the vehicle would occupy the crossing at maximum acceleration.
    pub window: Window,

    /// Acceleration chosen for the approach to this crossing.
    ///
    /// Units: meters/second^2
    pub acc_mss: f64,

    /// Predicted entry time at the chosen acceleration, `None` if the vehicle
    /// stops before reaching the crossing.
    ///
    /// Units: seconds
    pub expected_entry_s: Option<f64>,

    /// True if this vehicle installed the reservation.
    pub reserved: bool,

    /// Reservation this vehicle yielded to, if any.
    pub yielded_to: Option<Window>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Who is in control of a vehicle.
#[derive(Debug, Clone)]
pub enum Driver {
    /// Scheduled by the grid
    Autonomous(AutoState),

    /// Driven by a person, assumed to accelerate flat out
    Manual,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Car {
    pub fn new(track: &TrackParams, vehicle: &VehicleParams, motor: Box<dyn Motor>) -> Self {
        let driver = match vehicle.kind {
            VehicleKind::Auto => Driver::Autonomous(AutoState::default()),
            VehicleKind::Human => Driver::Manual,
        };

        Self {
            track_id: track.id,
            axis: track.axis,
            length_m: vehicle.length_m,
            usable_length_m: track.usable_length_m,
            motor,
            driver,
        }
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn length_m(&self) -> f64 {
        self.length_m
    }

    pub fn usable_length_m(&self) -> f64 {
        self.usable_length_m
    }

    pub fn kind(&self) -> VehicleKind {
        match self.driver {
            Driver::Autonomous(_) => VehicleKind::Auto,
            Driver::Manual => VehicleKind::Human,
        }
    }

    pub fn is_auto(&self) -> bool {
        self.kind() == VehicleKind::Auto
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub(super) fn driver_mut(&mut self) -> &mut Driver {
        &mut self.driver
    }

    pub fn motor(&self) -> &dyn Motor {
        self.motor.as_ref()
    }

    pub fn position(&self) -> f64 {
        self.motor.position()
    }

    pub fn velocity(&self) -> f64 {
        self.motor.velocity()
    }

    /// Crossings planned for this vehicle in the last cycle, empty for a
    /// manually driven vehicle.
    pub fn plan(&self) -> &[PlannedCrossing] {
        match &self.driver {
            Driver::Autonomous(state) => &state.plan,
            Driver::Manual => &[],
        }
    }

    /// True once the vehicle has passed the end of the usable track.
    pub fn is_past_end(&self) -> bool {
        self.position() > self.usable_length_m
    }

    /// Distance along this vehicle's track to the leading edge of the
    /// intersection.
    ///
    /// # Panics
    /// - If the intersection is not on this vehicle's track.
    pub fn pos_of(&self, i: &Intersection) -> f64 {
        if i.across_id == self.track_id {
            i.across_pos_m
        }
        else if i.down_id == self.track_id {
            i.down_pos_m
        }
        else {
            raise_error!(
                "Car on track {} is not on a track with intersection ({}, {})",
                self.track_id,
                i.across_id,
                i.down_id
            )
        }
    }

    /// Width of the intersection as seen travelling along this vehicle's
    /// track.
    ///
    /// # Panics
    /// - If the intersection is not on this vehicle's track.
    pub fn wd_of(&self, i: &Intersection) -> f64 {
        if i.across_id == self.track_id {
            i.across_width_m
        }
        else if i.down_id == self.track_id {
            i.down_width_m
        }
        else {
            raise_error!(
                "Car on track {} is not on a track with intersection ({}, {})",
                self.track_id,
                i.across_id,
                i.down_id
            )
        }
    }

    /// Window during which this vehicle would occupy a crossing `disp_m` ahead
    /// of it and `width_m` wide, starting at `time_s` with velocity `vel_ms`
    /// and holding acceleration `acc_mss`.
    ///
    /// The vehicle is in the crossing from when its front reaches the leading
    /// edge until its back clears the far edge.
    pub fn create_window(
        &self,
        limits: &Limits,
        time_s: f64,
        disp_m: f64,
        vel_ms: f64,
        acc_mss: f64,
        width_m: f64,
    ) -> Result<Window, KinematicsError> {
        let enter_s = limits.time_to_cover(disp_m, vel_ms, acc_mss)?;
        let exit_s = limits.time_to_cover(disp_m + self.length_m + width_m, vel_ms, acc_mss)?;

        if enter_s > exit_s {
            raise_error!(
                "Car on track {} would exit a crossing ({} s) before entering it ({} s)",
                self.track_id,
                exit_s,
                enter_s
            );
        }

        Ok(Window::new(time_s + enter_s, time_s + exit_s))
    }

    /// Acceleration to use once there are no more intersections ahead: reach
    /// the turning velocity by the end of the usable track, or do nothing if
    /// already past it.
    pub fn final_acc(&self, limits: &Limits, pos_m: f64, vel_ms: f64) -> f64 {
        let remaining_m = self.usable_length_m - pos_m;

        if remaining_m <= 0.0 {
            0.0
        }
        else {
            limits.acceleration_to_reach(vel_ms, limits.turn_vel_ms, remaining_m)
        }
    }
}

impl std::fmt::Debug for Car {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Car")
            .field("track_id", &self.track_id)
            .field("axis", &self.axis)
            .field("length_m", &self.length_m)
            .field("usable_length_m", &self.usable_length_m)
            .field("driver", &self.driver)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{grid::IntersectionParams, motor_ctrl::SimMotor};
    use assert_approx_eq::assert_approx_eq;

    fn car(kind: VehicleKind) -> Car {
        let track = TrackParams {
            id: 3,
            axis: Axis::Down,
            pin: 5,
            usable_length_m: 0.8,
            vehicle: None,
        };
        let vehicle = VehicleParams {
            kind,
            length_m: 0.04,
        };

        Car::new(
            &track,
            &vehicle,
            Box::new(SimMotor::stepped(Limits::default())),
        )
    }

    fn intersection(across_id: TrackId, down_id: TrackId) -> Intersection {
        Intersection::new(&IntersectionParams {
            across_id,
            down_id,
            across_width_m: 0.02,
            down_width_m: 0.03,
            across_pos_m: 0.1,
            down_pos_m: 0.25,
        })
    }

    #[test]
    fn test_position_and_width_on_own_axis() {
        let c = car(VehicleKind::Auto);
        let i = intersection(0, 3);

        assert_eq!(c.pos_of(&i), 0.25);
        assert_eq!(c.wd_of(&i), 0.03);
        assert!(c.is_auto());
        assert!(c.plan().is_empty());
        assert_eq!(car(VehicleKind::Human).kind(), VehicleKind::Human);
    }

    #[test]
    #[should_panic]
    fn test_pos_of_other_track() {
        car(VehicleKind::Auto).pos_of(&intersection(0, 4));
    }

    #[test]
    fn test_create_window() {
        let l = Limits::default();
        let c = car(VehicleKind::Auto);

        // From rest at 1 m/s^2: 0.02 m takes 0.2 s, 0.08 m (with the car and
        // crossing) takes 0.4 s
        let w = c.create_window(&l, 1.0, 0.02, 0.0, 1.0, 0.02).unwrap();
        assert_approx_eq!(w.entry_s, 1.2);
        assert_approx_eq!(w.exit_s, 1.4);

        assert!(c.create_window(&l, 0.0, 0.1, 0.0, 0.0, 0.02).is_err());
    }

    #[test]
    fn test_final_acc() {
        let l = Limits::default();
        let c = car(VehicleKind::Auto);

        // Slowing from 0.5 m/s to the turning velocity over 0.4 m
        assert_approx_eq!(c.final_acc(&l, 0.4, 0.5), (0.09 - 0.25) / 0.8);

        // Speeding up to the turning velocity
        assert!(c.final_acc(&l, 0.4, 0.1) > 0.0);

        // Past the end
        assert_eq!(c.final_acc(&l, 0.9, 0.5), 0.0);
    }
}
