//! Intersections and their reservation windows

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::Serialize;
use util::raise_error;

use super::{IntersectionParams, TrackId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A span of time during which a vehicle occupies an intersection.
///
/// Times are relative to the start of the current planning cycle. An open
/// ended window has an infinite exit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Window {
    /// Units: seconds
    pub entry_s: f64,

    /// Units: seconds
    pub exit_s: f64,
}

/// The crossing of an across track and a down track.
///
/// Holds at most one reservation at a time.
#[derive(Debug, Clone, Serialize)]
pub struct Intersection {
    pub across_id: TrackId,
    pub down_id: TrackId,

    /// Units: meters
    pub across_width_m: f64,

    /// Units: meters
    pub down_width_m: f64,

    /// Units: meters
    pub across_pos_m: f64,

    /// Units: meters
    pub down_pos_m: f64,

    reservation: Option<Window>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Window {
    /// Create a new window.
    ///
    /// # Panics
    /// - If `entry_s` is after `exit_s`, which can only come from an error in
    ///   the planning calculations.
    pub fn new(entry_s: f64, exit_s: f64) -> Self {
        if entry_s > exit_s {
            raise_error!(
                "Window entry time {} s is after its exit time {} s",
                entry_s,
                exit_s
            );
        }

        Self { entry_s, exit_s }
    }

    /// Window with no exit, for a vehicle that may stay in the intersection
    /// indefinitely.
    pub fn open_ended(entry_s: f64) -> Self {
        Self::new(entry_s, std::f64::INFINITY)
    }

    pub fn is_open_ended(&self) -> bool {
        self.exit_s.is_infinite()
    }

    /// True if the windows share any instant, touching ends included.
    pub fn overlaps(&self, other: &Window) -> bool {
        !(self.exit_s < other.entry_s || self.entry_s > other.exit_s)
    }
}

impl Intersection {
    pub fn new(params: &IntersectionParams) -> Self {
        Self {
            across_id: params.across_id,
            down_id: params.down_id,
            across_width_m: params.across_width_m,
            down_width_m: params.down_width_m,
            across_pos_m: params.across_pos_m,
            down_pos_m: params.down_pos_m,
            reservation: None,
        }
    }

    /// Install a reservation, replacing any existing one.
    pub fn reserve(&mut self, window: Window) {
        if let Some(existing) = self.reservation {
            warn!(
                "Intersection ({}, {}) already reserved for {:?}, overwriting with {:?}",
                self.across_id, self.down_id, existing, window
            );
        }

        self.reservation = Some(window);
    }

    pub fn current_reservation(&self) -> Option<Window> {
        self.reservation
    }

    /// Clear the reservation ahead of a new planning cycle.
    pub fn reset(&mut self) {
        self.reservation = None;
    }

    /// True if the given track passes through this intersection.
    pub fn is_on(&self, track_id: TrackId) -> bool {
        self.across_id == track_id || self.down_id == track_id
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
