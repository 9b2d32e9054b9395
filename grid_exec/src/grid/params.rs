//! Parameters describing the layout of the grid

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::TrackId;
use crate::{kinematics::Limits, motor_ctrl::MotorParams};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default length of a vehicle.
///
/// Units: meters
pub const VEHICLE_LENGTH_M: f64 = 0.04;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Complete description of the grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridParams {
    /// Kinematic limits shared by every vehicle.
    #[serde(default)]
    pub limits: Limits,

    /// Parameters of the motors driving the tracks.
    #[serde(default)]
    pub motor: MotorParams,

    pub tracks: Vec<TrackParams>,

    pub intersections: Vec<IntersectionParams>,
}

/// A single track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackParams {
    pub id: TrackId,

    pub axis: Axis,

    /// Step pin of the motor driving this track.
    pub pin: u8,

    /// Length of track a vehicle can use before it must turn off.
    ///
    /// Units: meters
    pub usable_length_m: f64,

    /// The vehicle on this track, if there is one.
    #[serde(default)]
    pub vehicle: Option<VehicleParams>,
}

/// A vehicle placed on a track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VehicleParams {
    pub kind: VehicleKind,

    /// Units: meters
    #[serde(default = "default_vehicle_length")]
    pub length_m: f64,
}

/// A crossing of an across track and a down track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntersectionParams {
    pub across_id: TrackId,
    pub down_id: TrackId,

    /// Width of the crossing seen by a vehicle on the across track.
    ///
    /// Units: meters
    pub across_width_m: f64,

    /// Width of the crossing seen by a vehicle on the down track.
    ///
    /// Units: meters
    pub down_width_m: f64,

    /// Distance along the across track to the leading edge of the crossing.
    ///
    /// Units: meters
    pub across_pos_m: f64,

    /// Distance along the down track to the leading edge of the crossing.
    ///
    /// Units: meters
    pub down_pos_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Direction a track runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Across,
    Down,
}

/// Who is driving a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
    Auto,
    Human,
}

/// Errors in the description of the grid.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Track {0} is defined more than once")]
    DuplicateTrack(TrackId),

    #[error("Pin {0} is used by more than one track")]
    DuplicatePin(u8),

    #[error("Intersection ({0}, {1}) refers to a track which doesn't exist")]
    UnknownTrack(TrackId, TrackId),

    #[error("Intersection ({0}, {1}) expects track {2} to run {3:?}")]
    WrongAxis(TrackId, TrackId, TrackId, Axis),

    #[error("Intersection ({0}, {1}) is defined more than once")]
    DuplicateIntersection(TrackId, TrackId),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

fn default_vehicle_length() -> f64 {
    VEHICLE_LENGTH_M
}

impl GridParams {
    /// Check the grid is consistent and physically meaningful.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let l = &self.limits;
        if !(l.max_vel_ms > 0.0)
            || !(l.max_acc_mss > 0.0)
            || !(l.min_acc_mss < 0.0)
            || !(l.turn_vel_ms >= 0.0 && l.turn_vel_ms <= l.max_vel_ms)
        {
            return Err(TopologyError::InvalidParams(format!(
                "kinematic limits are inconsistent: {:?}",
                l
            )));
        }

        self.motor
            .are_valid()
            .map_err(|e| TopologyError::InvalidParams(e.to_string()))?;

        let mut axes = HashMap::new();
        let mut pins = HashSet::new();

        for track in &self.tracks {
            if axes.insert(track.id, track.axis).is_some() {
                return Err(TopologyError::DuplicateTrack(track.id));
            }
            if !pins.insert(track.pin) {
                return Err(TopologyError::DuplicatePin(track.pin));
            }
            if !(track.usable_length_m > 0.0) {
                return Err(TopologyError::InvalidGeometry(format!(
                    "track {} has a non-positive usable length",
                    track.id
                )));
            }
            if let Some(v) = track.vehicle {
                if !(v.length_m > 0.0) {
                    return Err(TopologyError::InvalidGeometry(format!(
                        "vehicle on track {} has a non-positive length",
                        track.id
                    )));
                }
            }
        }

        let mut seen = HashSet::new();

        for i in &self.intersections {
            let (a, d) = (i.across_id, i.down_id);

            for &(id, expected) in [(a, Axis::Across), (d, Axis::Down)].iter() {
                match axes.get(&id) {
                    None => return Err(TopologyError::UnknownTrack(a, d)),
                    Some(&axis) if axis != expected => {
                        return Err(TopologyError::WrongAxis(a, d, id, expected))
                    }
                    _ => (),
                }
            }

            if !seen.insert((a, d)) {
                return Err(TopologyError::DuplicateIntersection(a, d));
            }

            if !(i.across_width_m > 0.0 && i.down_width_m > 0.0) {
                return Err(TopologyError::InvalidGeometry(format!(
                    "intersection ({}, {}) has a non-positive width",
                    a, d
                )));
            }
            if !(i.across_pos_m >= 0.0 && i.down_pos_m >= 0.0) {
                return Err(TopologyError::InvalidGeometry(format!(
                    "intersection ({}, {}) has a negative position",
                    a, d
                )));
            }
        }

        Ok(())
    }

    /// The three by three test grid.
    ///
    /// Across tracks 0 to 2 run top to bottom, down tracks 3 to 5 run left to
    /// right. A human drives on track 1, every other track has an autonomous
    /// vehicle.
    pub fn standard() -> Self {
        let width_m = 0.02225;

        // Distance from the start of each track to the first crossing
        let start_across_m = 0.1;
        let start_down_m = 0.1;

        // Gap between neighbouring parallel tracks
        let gap_across_m = 0.1524;
        let gap_down_m = 0.2275;

        let across_pos_m: Vec<f64> = (0..3)
            .map(|n| start_across_m + n as f64 * (width_m + gap_across_m))
            .collect();
        let down_pos_m: Vec<f64> = (0..3)
            .map(|n| start_down_m + n as f64 * (width_m + gap_down_m))
            .collect();

        let pins = [17, 27, 22, 5, 6, 13];

        let tracks = (0..6)
            .map(|id| TrackParams {
                id,
                axis: if id < 3 { Axis::Across } else { Axis::Down },
                pin: pins[id],
                usable_length_m: if id < 3 { 0.6 } else { 0.8 },
                vehicle: Some(VehicleParams {
                    kind: if id == 1 {
                        VehicleKind::Human
                    }
                    else {
                        VehicleKind::Auto
                    },
                    length_m: VEHICLE_LENGTH_M,
                }),
            })
            .collect();

        let mut intersections = Vec::with_capacity(9);
        for across_id in 0..3 {
            for down_id in 3..6 {
                intersections.push(IntersectionParams {
                    across_id,
                    down_id,
                    across_width_m: width_m,
                    down_width_m: width_m,
                    across_pos_m: across_pos_m[down_id - 3],
                    down_pos_m: down_pos_m[across_id],
                });
            }
        }

        Self {
            limits: Limits::default(),
            motor: MotorParams::default(),
            tracks,
            intersections,
        }
    }

    /// Map from track to motor pin.
    pub fn pins(&self) -> HashMap<TrackId, u8> {
        self.tracks.iter().map(|t| (t.id, t.pin)).collect()
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
    fn test_standard_is_valid() {
        let p = GridParams::standard();
        p.validate().unwrap();

        assert_eq!(p.tracks.len(), 6);
        assert_eq!(p.intersections.len(), 9);

        let human: Vec<_> = p
            .tracks
            .iter()
            .filter(|t| matches!(t.vehicle, Some(v) if v.kind == VehicleKind::Human))
            .map(|t| t.id)
            .collect();
        assert_eq!(human, vec![1]);

        // Middle crossing
        let mid = p
            .intersections
            .iter()
            .find(|i| i.across_id == 1 && i.down_id == 4)
            .unwrap();
        assert_approx_eq!(mid.across_pos_m, 0.1 + 0.02225 + 0.1524);
        assert_approx_eq!(mid.down_pos_m, 0.1 + 0.02225 + 0.2275);
    }

    #[test]
    fn test_validate_rejects_bad_topology() {
        let mut p = GridParams::standard();
        p.intersections[0].across_id = 4;
        assert!(matches!(
            p.validate(),
            Err(TopologyError::WrongAxis(4, 3, 4, Axis::Across))
        ));

        let mut p = GridParams::standard();
        p.intersections[0].down_id = 9;
        assert!(matches!(p.validate(), Err(TopologyError::UnknownTrack(0, 9))));

        let mut p = GridParams::standard();
        let dup = p.intersections[4];
        p.intersections.push(dup);
        assert!(matches!(
            p.validate(),
            Err(TopologyError::DuplicateIntersection(1, 4))
        ));

        let mut p = GridParams::standard();
        p.tracks[2].pin = p.tracks[0].pin;
        assert!(matches!(p.validate(), Err(TopologyError::DuplicatePin(17))));

        let mut p = GridParams::standard();
        p.limits.min_acc_mss = 1.0;
        assert!(matches!(p.validate(), Err(TopologyError::InvalidParams(_))));
    }

    #[test]
    fn test_deserialise() {
        let toml_str = r#"
            [limits]
            max_vel_ms = 0.4

            [[tracks]]
            id = 0
            axis = "across"
            pin = 17
            usable_length_m = 0.6
            vehicle = { kind = "auto" }

            [[tracks]]
            id = 3
            axis = "down"
            pin = 5
            usable_length_m = 0.8

            [[intersections]]
            across_id = 0
            down_id = 3
            across_width_m = 0.02225
            down_width_m = 0.02225
            across_pos_m = 0.1
            down_pos_m = 0.1
        "#;

        let p: GridParams = util::params::from_str(toml_str).unwrap();
        p.validate().unwrap();

        assert_eq!(p.limits.max_vel_ms, 0.4);
        assert_eq!(p.limits.max_acc_mss, Limits::default().max_acc_mss);
        assert_eq!(p.tracks[0].vehicle.unwrap().length_m, VEHICLE_LENGTH_M);
        assert!(p.tracks[1].vehicle.is_none());
    }

    #[test]
    fn test_shipped_params_match_standard() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("params")
            .join("grid.toml");
        let loaded: GridParams = util::params::load_from_path(path).unwrap();
        loaded.validate().unwrap();

        let standard = GridParams::standard();
        assert_eq!(loaded.limits, standard.limits);
        assert_eq!(loaded.motor, standard.motor);
        assert_eq!(loaded.pins(), standard.pins());

        for (l, s) in loaded.intersections.iter().zip(standard.intersections.iter()) {
            assert_eq!((l.across_id, l.down_id), (s.across_id, s.down_id));
            assert_approx_eq!(l.across_pos_m, s.across_pos_m, 1e-6);
            assert_approx_eq!(l.down_pos_m, s.down_pos_m, 1e-6);
        }
    }
}
