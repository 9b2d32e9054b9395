//! # Grid
//!
//! The grid is a set of tracks crossing each other at intersections, with at
//! most one vehicle on each track. Once per planning cycle the grid works out
//! an acceleration for every autonomous vehicle such that no two vehicles hold
//! overlapping windows of time in the same intersection.
//!
//! Manual (human driven) vehicles are assumed to accelerate as hard as they can
//! and never leave a crossing once in it, so they claim every intersection
//! ahead of them first. Autonomous vehicles then claim intersections in
//! configuration order, each one yielding to whatever was claimed before it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod car;
mod intersection;
mod params;
mod scheduler;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use car::*;
pub use intersection::*;
pub use params::*;
pub use scheduler::*;

use crate::{kinematics::KinematicsError, motor_ctrl::MotorError};

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Identifier of a track in the grid.
pub type TrackId = usize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while building or planning the grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("Invalid grid topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("Could not create the motor for track {0}: {1}")]
    Motor(TrackId, MotorError),

    #[error("Kinematics error while planning track {0}: {1}")]
    Kinematics(TrackId, KinematicsError),

    #[error("No vehicle is on track {0}")]
    NoVehicle(TrackId),
}
