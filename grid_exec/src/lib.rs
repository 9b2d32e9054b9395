//! # Track grid library.
//!
//! This library allows the executable, benchmarks and tests to access the
//! planning and motor control items defined inside the grid crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Grid module - vehicles, intersections and the reservation scheduler
pub mod grid;

/// Kinematics - motion relationships under velocity and acceleration limits
pub mod kinematics;

/// Motor control - turns target accelerations into motor motion
pub mod motor_ctrl;

/// Executable parameters
pub mod params;
