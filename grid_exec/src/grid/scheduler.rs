//! Intersection reservation scheduler

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::cmp::Ordering;

use log::{debug, info, trace, warn};
use serde::Serialize;
use util::raise_error;

use super::{
    Car, Driver, GridError, GridParams, Intersection, PlannedCrossing, TrackId, VehicleKind,
    Window,
};
use crate::{
    kinematics::{KinematicsError, Limits},
    motor_ctrl::MotorFactory,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Slack allowed when comparing a predicted arrival with a reservation exit.
///
/// Units: seconds
const ARRIVAL_TOLERANCE_S: f64 = 1e-9;

/// Slack allowed when comparing a stopping distance with the distance to a
/// crossing.
///
/// Units: meters
const ARRIVAL_TOLERANCE_M: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The grid of tracks, vehicles and intersections.
#[derive(Debug)]
pub struct Grid {
    limits: Limits,
    cars: Vec<Car>,
    intersections: Vec<Intersection>,
}

/// Acceleration to apply to the vehicle on a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccelCommand {
    pub track_id: TrackId,

    /// Units: meters/second^2
    pub acc_mss: f64,
}

/// Serialisable view of the grid at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct GridSnapshot {
    pub cars: Vec<CarSnapshot>,
    pub intersections: Vec<Intersection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarSnapshot {
    pub track_id: TrackId,
    pub kind: VehicleKind,
    pub position_m: f64,
    pub velocity_ms: f64,
    pub acceleration_mss: f64,
    pub plan: Vec<PlannedCrossing>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Grid {
    /// Build the grid, creating a motor for every track with a vehicle on it.
    pub fn new(params: &GridParams, factory: &dyn MotorFactory) -> Result<Self, GridError> {
        params.validate()?;

        let mut cars = Vec::new();

        for track in &params.tracks {
            if let Some(vehicle) = &track.vehicle {
                let motor = factory
                    .create(track.id)
                    .map_err(|e| GridError::Motor(track.id, e))?;

                cars.push(Car::new(track, vehicle, motor));
            }
        }

        let intersections = params.intersections.iter().map(Intersection::new).collect();

        info!(
            "Grid built with {} vehicles and {} intersections",
            cars.len(),
            params.intersections.len()
        );

        Ok(Self {
            limits: params.limits,
            cars,
            intersections,
        })
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn car(&self, track_id: TrackId) -> Option<&Car> {
        self.cars.iter().find(|c| c.track_id() == track_id)
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    /// Intersections on the track which are strictly ahead of the vehicle on
    /// it, nearest first.
    pub fn intersections_ahead(&self, track_id: TrackId) -> Result<Vec<&Intersection>, GridError> {
        let car = self.car(track_id).ok_or(GridError::NoVehicle(track_id))?;

        Ok(ahead_of(&self.intersections, car, car.position())
            .into_iter()
            .map(|idx| &self.intersections[idx])
            .collect())
    }

    /// Plan the current cycle, returning one command per autonomous vehicle
    /// in configuration order.
    ///
    /// All reservations from the previous cycle are discarded first. Manual
    /// vehicles then claim every intersection ahead of them, and autonomous
    /// vehicles are planned one after the other.
    pub fn find_accelerations(&mut self) -> Result<Vec<AccelCommand>, GridError> {
        for i in self.intersections.iter_mut() {
            i.reset();
        }

        let limits = self.limits;

        for car in self.cars.iter().filter(|c| !c.is_auto()) {
            reserve_manual(&limits, car, &mut self.intersections)?;
        }

        let mut commands = Vec::new();

        for car in self.cars.iter_mut().filter(|c| c.is_auto()) {
            let acc_mss = plan_auto(&limits, car, &mut self.intersections)?;

            debug!("Track {} commanded {:.4} m/s^2", car.track_id(), acc_mss);

            commands.push(AccelCommand {
                track_id: car.track_id(),
                acc_mss,
            });
        }

        Ok(commands)
    }

    /// Push commands into the motors of their vehicles.
    pub fn apply(&self, commands: &[AccelCommand]) -> Result<(), GridError> {
        for cmd in commands {
            self.car(cmd.track_id)
                .ok_or(GridError::NoVehicle(cmd.track_id))?
                .motor()
                .set_acceleration(cmd.acc_mss);
        }

        Ok(())
    }

    /// Plan the current cycle and apply the result.
    pub fn step(&mut self) -> Result<Vec<AccelCommand>, GridError> {
        let commands = self.find_accelerations()?;
        self.apply(&commands)?;

        Ok(commands)
    }

    /// True once every autonomous vehicle has passed the end of its usable
    /// track.
    pub fn is_finished(&self) -> bool {
        self.cars
            .iter()
            .filter(|c| c.is_auto())
            .all(|c| c.is_past_end())
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            cars: self
                .cars
                .iter()
                .map(|c| CarSnapshot {
                    track_id: c.track_id(),
                    kind: c.kind(),
                    position_m: c.position(),
                    velocity_ms: c.velocity(),
                    acceleration_mss: c.motor().acceleration(),
                    plan: c.plan().to_vec(),
                })
                .collect(),
            intersections: self.intersections.clone(),
        }
    }

    /// Halt every motor in the grid.
    pub fn halt(&self) {
        for car in &self.cars {
            car.motor().halt();
        }
    }
}

/// Indices of the intersections on the vehicle's track lying strictly ahead
/// of `pos_m`, sorted by distance along that track.
fn ahead_of(intersections: &[Intersection], car: &Car, pos_m: f64) -> Vec<usize> {
    let mut ahead: Vec<(usize, f64)> = intersections
        .iter()
        .enumerate()
        .filter(|(_, i)| i.is_on(car.track_id()))
        .map(|(idx, i)| (idx, car.pos_of(i)))
        .filter(|&(_, p)| p > pos_m)
        .collect();

    ahead.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    ahead.into_iter().map(|(idx, _)| idx).collect()
}

/// Claim every intersection ahead of a manually driven vehicle from the
/// earliest time it could arrive, with no exit.
fn reserve_manual(
    limits: &Limits,
    car: &Car,
    intersections: &mut [Intersection],
) -> Result<(), GridError> {
    let pos_m = car.position();
    let vel_ms = car.velocity();

    for idx in ahead_of(intersections, car, pos_m) {
        let i = &mut intersections[idx];
        let disp_m = car.pos_of(i) - pos_m;

        let entry_s = limits
            .time_to_cover(disp_m, vel_ms, limits.max_acc_mss)
            .map_err(|e| GridError::Kinematics(car.track_id(), e))?;

        trace!(
            "Manual track {} claims ({}, {}) from {:.4} s",
            car.track_id(),
            i.across_id,
            i.down_id,
            entry_s
        );

        i.reserve(Window::open_ended(entry_s));
    }

    Ok(())
}

/// Plan an autonomous vehicle through the intersections ahead of it,
/// returning the acceleration for its approach to the first one.
fn plan_auto(
    limits: &Limits,
    car: &mut Car,
    intersections: &mut [Intersection],
) -> Result<f64, GridError> {
    let track_id = car.track_id();
    let kin_err = |e: KinematicsError| GridError::Kinematics(track_id, e);

    // Simulated state of the vehicle as it works through the crossings
    let mut time_s = 0.0;
    let mut pos_m = car.position();
    let mut vel_ms = car.velocity();

    let mut plan = Vec::new();
    let mut first_acc_mss = None;

    for idx in ahead_of(intersections, car, pos_m) {
        let i = &mut intersections[idx];

        // The simulated vehicle may already overlap the next crossing if the
        // crossings are closer than a vehicle length
        let disp_m = (car.pos_of(i) - pos_m).max(0.0);
        let width_m = car.wd_of(i);

        let window =
            car.create_window(limits, time_s, disp_m, vel_ms, limits.max_acc_mss, width_m)
                .map_err(kin_err)?;

        let reservation = i.current_reservation();
        let mut stop_before = false;

        let acc_mss = match reservation {
            Some(r) if r.overlaps(&window) => {
                if r.is_open_ended() {
                    // Whoever holds this may never leave, so stop short of it
                    stop_before = true;
                    limits.acceleration_to_reach(vel_ms, 0.0, disp_m)
                }
                else {
                    let time_to_clear_s = r.exit_s - time_s;
                    if time_to_clear_s < 0.0 {
                        raise_error!(
                            "Track {} overlaps reservation {:?} which cleared before {} s",
                            track_id,
                            r,
                            time_s
                        );
                    }

                    let acc_mss = limits.acceleration_for(disp_m, vel_ms, time_to_clear_s);

                    // Braking curves reach the crossing on their first root,
                    // and clamped solutions arrive early, so check when the
                    // vehicle really gets there
                    match limits.time_to_cover(disp_m, vel_ms, acc_mss) {
                        Ok(t) if time_s + t < r.exit_s - ARRIVAL_TOLERANCE_S => {
                            stop_before = true;
                            limits.acceleration_to_reach(vel_ms, 0.0, disp_m)
                        }
                        _ => acc_mss,
                    }
                }
            }
            _ => limits.max_acc_mss,
        };

        if reservation.is_none() {
            i.reserve(window);
        }

        // A vehicle which stops at or before the leading edge never enters
        let expected_entry_s = if stop_before
            && limits.stopping_distance(vel_ms, acc_mss) <= disp_m + ARRIVAL_TOLERANCE_M
        {
            None
        }
        else {
            limits
                .time_to_cover(disp_m, vel_ms, acc_mss)
                .ok()
                .map(|t| time_s + t)
        };

        if let (true, Some(entry_s), Some(r)) = (stop_before, expected_entry_s, reservation) {
            warn!(
                "Track {} cannot stop short of ({}, {}) and enters at {:.4} s while it is held \
                until {:.4} s",
                track_id,
                i.across_id,
                i.down_id,
                entry_s,
                r.exit_s
            );
        }

        trace!(
            "Track {} at ({}, {}): window {:?}, acc {:.4} m/s^2, blocked by {:?}",
            track_id,
            i.across_id,
            i.down_id,
            window,
            acc_mss,
            reservation
        );

        plan.push(PlannedCrossing {
            across_id: i.across_id,
            down_id: i.down_id,
            window,
            acc_mss,
            expected_entry_s,
            reserved: reservation.is_none(),
            yielded_to: reservation.filter(|r| r.overlaps(&window)),
        });

        if first_acc_mss.is_none() {
            first_acc_mss = Some(acc_mss);
        }

        if stop_before {
            break;
        }

        // Move the simulated vehicle on to the moment it clears the crossing
        let clear_disp_m = disp_m + car.length_m() + width_m;
        match limits.time_to_cover(clear_disp_m, vel_ms, acc_mss) {
            Ok(dt_s) => {
                vel_ms = limits.velocity_after(vel_ms, acc_mss, dt_s);
                time_s += dt_s;
                pos_m += clear_disp_m;
            }
            Err(_) => {
                // Braking hard enough to stop before clearing, so nothing
                // further along can be reached on this plan
                break;
            }
        }
    }

    let acc_mss = match first_acc_mss {
        Some(a) => a,
        None => car.final_acc(limits, pos_m, vel_ms),
    };

    if let Driver::Autonomous(state) = car.driver_mut() {
        state.plan = plan;
        state.last_acc_mss = Some(acc_mss);
    }

    Ok(acc_mss)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        grid::{Axis, IntersectionParams, TrackParams, VehicleParams},
        motor_ctrl::{Motor, MotorError, MotorParams, SimMotor},
    };
    use assert_approx_eq::assert_approx_eq;
    use std::collections::HashMap;

    /// Creates stepped simulated motors already in a given state.
    struct PresetFactory {
        limits: Limits,
        states: HashMap<TrackId, (f64, f64)>,
    }

    impl MotorFactory for PresetFactory {
        fn create(&self, track_id: TrackId) -> Result<Box<dyn Motor>, MotorError> {
            let motor = SimMotor::stepped(self.limits);

            if let Some(&(pos_m, vel_ms)) = self.states.get(&track_id) {
                // Accelerate for one second to get up to speed
                motor.set_acceleration(vel_ms);
                motor.advance(1.0);
                motor.set_acceleration(0.0);
                motor.calibrate(pos_m);
            }

            Ok(Box::new(motor))
        }
    }

    fn factory(states: &[(TrackId, f64, f64)]) -> PresetFactory {
        PresetFactory {
            limits: Limits::default(),
            states: states.iter().map(|&(id, p, v)| (id, (p, v))).collect(),
        }
    }

    fn track(id: TrackId, axis: Axis, kind: Option<VehicleKind>) -> TrackParams {
        TrackParams {
            id,
            axis,
            pin: id as u8,
            usable_length_m: 1.0,
            vehicle: kind.map(|kind| VehicleParams {
                kind,
                length_m: 0.04,
            }),
        }
    }

    fn crossing(across_id: TrackId, down_id: TrackId, across_pos_m: f64, down_pos_m: f64) -> IntersectionParams {
        IntersectionParams {
            across_id,
            down_id,
            across_width_m: 0.02225,
            down_width_m: 0.02225,
            across_pos_m,
            down_pos_m,
        }
    }

    fn two_track(kind_across: VehicleKind, kind_down: VehicleKind) -> GridParams {
        GridParams {
            limits: Limits::default(),
            motor: MotorParams::default(),
            tracks: vec![
                track(0, Axis::Across, Some(kind_across)),
                track(3, Axis::Down, Some(kind_down)),
            ],
            intersections: vec![crossing(0, 3, 0.1, 0.1)],
        }
    }

    #[test]
    fn test_two_autos_share_crossing() {
        let l = Limits::default();
        let mut grid = Grid::new(
            &two_track(VehicleKind::Auto, VehicleKind::Auto),
            &factory(&[]),
        )
        .unwrap();

        let cmds = grid.find_accelerations().unwrap();
        assert_eq!(cmds.len(), 2);

        // First vehicle goes flat out and claims the crossing
        assert_eq!(cmds[0].track_id, 0);
        assert_eq!(cmds[0].acc_mss, l.max_acc_mss);

        let entry_s = l.time_to_cover(0.1, 0.0, 3.0).unwrap();
        let exit_s = l.time_to_cover(0.1 + 0.04 + 0.02225, 0.0, 3.0).unwrap();
        assert_approx_eq!(entry_s, 0.283333, 1e-5);
        assert_approx_eq!(exit_s, 0.407833, 1e-5);

        let r = grid.intersections()[0].current_reservation().unwrap();
        assert_approx_eq!(r.entry_s, entry_s);
        assert_approx_eq!(r.exit_s, exit_s);

        // Second vehicle times its arrival for when the first has cleared
        assert_eq!(cmds[1].track_id, 3);
        assert!(cmds[1].acc_mss < l.max_acc_mss);
        assert_approx_eq!(cmds[1].acc_mss, 2.0 * 0.1 / exit_s.powi(2));

        let second = &grid.car(3).unwrap().plan()[0];
        assert!(!second.reserved);
        assert_eq!(second.yielded_to, Some(r));
        assert!(second.expected_entry_s.unwrap() >= r.exit_s - 1e-9);
    }

    /// A yielding vehicle either never enters the crossing or enters once the
    /// holder has left.
    fn assert_enters_after_exit(crossing: &PlannedCrossing) {
        if let (Some(r), Some(entry_s)) = (crossing.yielded_to, crossing.expected_entry_s) {
            assert!(
                entry_s >= r.exit_s - 1e-9,
                "enters ({}, {}) at {} s while held until {} s",
                crossing.across_id,
                crossing.down_id,
                entry_s,
                r.exit_s
            );
        }
    }

    #[test]
    fn test_moving_vehicle_stops_short_of_held_crossing() {
        let l = Limits::default();

        // Second vehicle is 0.08 m out at the cap. Solving for arrival at the
        // first vehicle's exit gives a braking curve that would reach the
        // crossing at about 0.263 s, long before it clears at 0.408 s
        let mut grid = Grid::new(
            &two_track(VehicleKind::Auto, VehicleKind::Auto),
            &factory(&[(3, 0.02, 0.5)]),
        )
        .unwrap();

        let cmds = grid.find_accelerations().unwrap();
        assert_eq!(cmds[0].acc_mss, l.max_acc_mss);

        let r = grid.intersections()[0].current_reservation().unwrap();
        let second = &grid.car(3).unwrap().plan()[0];
        assert_eq!(second.yielded_to, Some(r));

        // Brakes to a stop at the leading edge instead
        assert_approx_eq!(cmds[1].acc_mss, -0.25 / 0.16);
        assert_eq!(second.expected_entry_s, None);
        assert_eq!(grid.car(3).unwrap().plan().len(), 1);
        assert_approx_eq!(l.stopping_distance(0.5, cmds[1].acc_mss), 0.08);

        assert_enters_after_exit(second);
    }

    #[test]
    fn test_moving_vehicle_brakes_to_arrive_on_exit() {
        let l = Limits::default();

        // Crossing is 0.15 m ahead of the second vehicle at the cap, far
        // enough that it can slow down and still be moving when the first
        // vehicle clears
        let mut params = two_track(VehicleKind::Auto, VehicleKind::Auto);
        params.intersections = vec![crossing(0, 3, 0.1, 0.2)];

        let mut grid = Grid::new(&params, &factory(&[(3, 0.05, 0.5)])).unwrap();
        let cmds = grid.find_accelerations().unwrap();

        let r = grid.intersections()[0].current_reservation().unwrap();
        let second = &grid.car(3).unwrap().plan()[0];

        assert!(cmds[1].acc_mss < 0.0);
        assert_eq!(second.yielded_to, Some(r));

        let entry_s = l.time_to_cover(0.15, 0.5, cmds[1].acc_mss).unwrap();
        assert_approx_eq!(entry_s, r.exit_s, 1e-6);
        assert_approx_eq!(second.expected_entry_s.unwrap(), entry_s);
        assert_enters_after_exit(second);
    }

    #[test]
    fn test_clamped_braking_reports_conflict() {
        let l = Limits::default();

        // First vehicle is just short of the crossing at the cap and clears
        // it at 0.13 s. The second is 0.03 m out at the cap, inside its
        // stopping distance, so no permitted braking keeps it out until then
        let mut grid = Grid::new(
            &two_track(VehicleKind::Auto, VehicleKind::Auto),
            &factory(&[(0, 0.09725, 0.5), (3, 0.07, 0.5)]),
        )
        .unwrap();

        let cmds = grid.find_accelerations().unwrap();
        let r = grid.intersections()[0].current_reservation().unwrap();
        assert_approx_eq!(r.exit_s, 0.13);

        let required = 2.0 * (0.03 - 0.5 * r.exit_s) / r.exit_s.powi(2);
        assert!(required < l.min_acc_mss);
        assert!(l.stopping_distance(0.5, l.min_acc_mss) > 0.03);

        // Brakes as hard as possible and records the early entry
        assert_eq!(cmds[1].acc_mss, l.min_acc_mss);

        let second = &grid.car(3).unwrap().plan()[0];
        let entry_s = second.expected_entry_s.unwrap();
        assert_approx_eq!(entry_s, l.time_to_cover(0.03, 0.5, l.min_acc_mss).unwrap());
        assert!(entry_s < r.exit_s);
        assert_eq!(grid.car(3).unwrap().plan().len(), 1);
    }

    #[test]
    fn test_no_overlap_on_standard_grid() {
        let mut grid = Grid::new(&GridParams::standard(), &factory(&[])).unwrap();
        grid.find_accelerations().unwrap();

        for car in grid.cars().iter().filter(|c| c.is_auto()) {
            let first = &car.plan()[0];

            assert_enters_after_exit(first);
            match first.yielded_to {
                Some(r) if r.is_open_ended() => assert_eq!(first.acc_mss, 0.0),
                Some(_) => (),
                None => assert_eq!(first.acc_mss, grid.limits().max_acc_mss),
            }
        }

        // Every intersection is claimed by exactly one planned crossing or by
        // the manual vehicle
        for i in grid.intersections() {
            let claims = grid
                .cars()
                .iter()
                .flat_map(|c| c.plan().iter())
                .filter(|p| p.across_id == i.across_id && p.down_id == i.down_id && p.reserved)
                .count();

            match i.current_reservation() {
                Some(r) if r.is_open_ended() => assert_eq!(claims, 0),
                Some(_) => assert_eq!(claims, 1),
                None => assert_eq!(claims, 0),
            }
        }
    }

    #[test]
    fn test_manual_has_priority() {
        let l = Limits::default();

        // Stationary autonomous vehicle waits where it is
        let mut grid = Grid::new(
            &two_track(VehicleKind::Human, VehicleKind::Auto),
            &factory(&[]),
        )
        .unwrap();

        let cmds = grid.find_accelerations().unwrap();
        assert_eq!(cmds, vec![AccelCommand { track_id: 3, acc_mss: 0.0 }]);

        let r = grid.intersections()[0].current_reservation().unwrap();
        assert!(r.is_open_ended());
        assert_approx_eq!(r.entry_s, l.time_to_cover(0.1, 0.0, 3.0).unwrap());

        // Moving autonomous vehicle brakes to stop short of the crossing
        let mut grid = Grid::new(
            &two_track(VehicleKind::Human, VehicleKind::Auto),
            &factory(&[(3, 0.0, 0.3)]),
        )
        .unwrap();

        let cmds = grid.find_accelerations().unwrap();
        assert_approx_eq!(cmds[0].acc_mss, -0.09 / 0.2);
        assert_eq!(grid.car(3).unwrap().plan().len(), 1);
    }

    #[test]
    fn test_manual_ahead_of_crossing_is_ignored() {
        // Manual vehicle has already passed the crossing
        let mut grid = Grid::new(
            &two_track(VehicleKind::Human, VehicleKind::Auto),
            &factory(&[(0, 0.2, 0.0)]),
        )
        .unwrap();

        let cmds = grid.find_accelerations().unwrap();
        assert_eq!(cmds[0].acc_mss, Limits::default().max_acc_mss);
    }

    #[test]
    fn test_intersections_ahead_ordering() {
        let grid = Grid::new(
            &GridParams::standard(),
            &factory(&[(3, 0.2, 0.0), (0, 0.0, 0.0)]),
        )
        .unwrap();

        // Down track sorted on down positions, the first crossing is behind
        let ahead: Vec<_> = grid
            .intersections_ahead(3)
            .unwrap()
            .iter()
            .map(|i| (i.across_id, i.down_id))
            .collect();
        assert_eq!(ahead, vec![(1, 3), (2, 3)]);

        // Across track sorted on across positions
        let ahead: Vec<_> = grid
            .intersections_ahead(0)
            .unwrap()
            .iter()
            .map(|i| (i.across_id, i.down_id))
            .collect();
        assert_eq!(ahead, vec![(0, 3), (0, 4), (0, 5)]);

        assert!(matches!(
            grid.intersections_ahead(7),
            Err(GridError::NoVehicle(7))
        ));
    }

    #[test]
    fn test_final_acc_with_nothing_ahead() {
        let l = Limits::default();

        // Past the crossing at the cap, 0.6 m left on the track
        let mut grid = Grid::new(
            &two_track(VehicleKind::Auto, VehicleKind::Auto),
            &factory(&[(0, 0.4, 0.5)]),
        )
        .unwrap();

        let cmds = grid.find_accelerations().unwrap();
        assert_approx_eq!(
            cmds[0].acc_mss,
            (l.turn_vel_ms.powi(2) - 0.25) / (2.0 * 0.6)
        );
        assert!(grid.car(0).unwrap().plan().is_empty());

        // Past the end of the track
        let mut grid = Grid::new(
            &two_track(VehicleKind::Auto, VehicleKind::Auto),
            &factory(&[(0, 1.2, 0.5)]),
        )
        .unwrap();

        assert_eq!(grid.find_accelerations().unwrap()[0].acc_mss, 0.0);
    }

    #[test]
    fn test_reservations_reset_each_cycle() {
        let mut grid = Grid::new(
            &two_track(VehicleKind::Auto, VehicleKind::Auto),
            &factory(&[]),
        )
        .unwrap();

        let first = grid.find_accelerations().unwrap();
        let second = grid.find_accelerations().unwrap();

        assert_eq!(first, second);
        assert_eq!(grid.car(0).unwrap().plan().len(), 1);
        assert!(grid.car(0).unwrap().plan()[0].reserved);
    }

    #[test]
    fn test_step_and_finish() {
        let mut grid = Grid::new(
            &two_track(VehicleKind::Auto, VehicleKind::Auto),
            &factory(&[]),
        )
        .unwrap();
        assert!(!grid.is_finished());

        let cmds = grid.step().unwrap();
        for cmd in &cmds {
            assert_eq!(
                grid.car(cmd.track_id).unwrap().motor().acceleration(),
                cmd.acc_mss
            );
        }

        assert!(matches!(
            grid.apply(&[AccelCommand { track_id: 2, acc_mss: 1.0 }]),
            Err(GridError::NoVehicle(2))
        ));

        let snapshot = grid.snapshot();
        assert_eq!(snapshot.cars.len(), 2);
        assert!(snapshot.intersections[0].current_reservation().is_some());
        assert!(serde_json::to_string(&snapshot).is_ok());

        for car in grid.cars() {
            car.motor().calibrate(1.5);
        }
        assert!(grid.is_finished());

        grid.halt();
    }
}
