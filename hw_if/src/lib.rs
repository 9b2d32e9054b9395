//! # Hardware Interface Library
//!
//! This library defines the boundary between the track grid software and the
//! pins driving the track motors. Motor controllers only ever see the
//! [`PinDriver`] trait, so that the same control loop can run on the
//! Raspberry Pi or against the in-memory [`EmulatedPi`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Pin driver trait and associated types
pub mod gpio;

/// In-memory pin driver used for testing and for running off-target
pub mod emu;

/// Raspberry Pi GPIO driver
#[cfg(target_arch = "arm")]
pub mod raspi;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use emu::EmulatedPi;
pub use gpio::{HwError, Level, PinDriver, PinMode};

#[cfg(target_arch = "arm")]
pub use raspi::RaspiGpio;
