//! In-memory pin driver.
//!
//! The emulator tracks the mode and level of every pin it has been asked to
//! configure, and counts the rising edges written to each output so that tests
//! can check how many pulses a motor controller has emitted.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use log::trace;
use parking_lot::Mutex;

use crate::gpio::{HwError, Level, PinDriver, PinMode};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Emulated Raspberry Pi GPIO bank.
#[derive(Debug, Default)]
pub struct EmulatedPi {
    pins: Mutex<HashMap<u8, PinState>>,
}

#[derive(Debug, Clone, Copy)]
struct PinState {
    mode: PinMode,
    level: Level,
    rising_edges: u64,
    fail_writes: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EmulatedPi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of low to high transitions written to the pin.
    ///
    /// Unconfigured pins report zero.
    pub fn rising_edges(&self, pin: u8) -> u64 {
        self.pins.lock().get(&pin).map(|p| p.rising_edges).unwrap_or(0)
    }

    /// Current level of the pin, or `None` if it has not been configured.
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.pins.lock().get(&pin).map(|p| p.level)
    }

    /// Current mode of the pin, or `None` if it has not been configured.
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.pins.lock().get(&pin).map(|p| p.mode)
    }

    /// Drive the level seen on an input pin, as an external device would.
    pub fn set_input(&self, pin: u8, level: Level) -> Result<(), HwError> {
        let mut pins = self.pins.lock();
        let state = pins.get_mut(&pin).ok_or(HwError::PinNotConfigured(pin))?;

        match state.mode {
            PinMode::Input => {
                state.level = level;
                Ok(())
            }
            m => Err(HwError::WrongMode(pin, m)),
        }
    }

    /// Make every subsequent write to the pin fail (or succeed again).
    pub fn fail_writes(&self, pin: u8, fail: bool) -> Result<(), HwError> {
        let mut pins = self.pins.lock();
        let state = pins.get_mut(&pin).ok_or(HwError::PinNotConfigured(pin))?;
        state.fail_writes = fail;
        Ok(())
    }
}

impl PinDriver for EmulatedPi {
    fn pin_mode(&self, pin: u8, mode: PinMode) -> Result<(), HwError> {
        trace!("Set pin {} to mode {:?}", pin, mode);

        let mut pins = self.pins.lock();
        let state = pins.entry(pin).or_insert(PinState {
            mode,
            level: Level::Low,
            rising_edges: 0,
            fail_writes: false,
        });
        state.mode = mode;

        Ok(())
    }

    fn digital_write(&self, pin: u8, level: Level) -> Result<(), HwError> {
        let mut pins = self.pins.lock();
        let state = pins.get_mut(&pin).ok_or(HwError::PinNotConfigured(pin))?;

        if state.mode != PinMode::Output {
            return Err(HwError::WrongMode(pin, state.mode));
        }
        if state.fail_writes {
            return Err(HwError::WriteFailed(pin));
        }

        if state.level == Level::Low && level == Level::High {
            state.rising_edges += 1;
        }
        state.level = level;

        Ok(())
    }

    fn digital_read(&self, pin: u8) -> Result<Level, HwError> {
        let pins = self.pins.lock();
        let state = pins.get(&pin).ok_or(HwError::PinNotConfigured(pin))?;

        match state.mode {
            PinMode::Input => Ok(state.level),
            m => Err(HwError::WrongMode(pin, m)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rising_edges() {
        let pi = EmulatedPi::new();
        pi.pin_mode(4, PinMode::Output).unwrap();

        for _ in 0..3 {
            pi.digital_write(4, Level::High).unwrap();
            pi.digital_write(4, Level::High).unwrap();
            pi.digital_write(4, Level::Low).unwrap();
        }

        assert_eq!(pi.rising_edges(4), 3);
        assert_eq!(pi.level(4), Some(Level::Low));
        assert_eq!(pi.rising_edges(5), 0);
    }

    #[test]
    fn test_unconfigured_and_wrong_mode() {
        let pi = EmulatedPi::new();

        assert!(matches!(
            pi.digital_write(1, Level::High),
            Err(HwError::PinNotConfigured(1))
        ));

        pi.pin_mode(1, PinMode::Input).unwrap();
        assert!(matches!(
            pi.digital_write(1, Level::High),
            Err(HwError::WrongMode(1, PinMode::Input))
        ));
        assert_eq!(pi.digital_read(1).unwrap(), Level::Low);

        pi.set_input(1, Level::High).unwrap();
        assert_eq!(pi.digital_read(1).unwrap(), Level::High);

        pi.pin_mode(2, PinMode::Output).unwrap();
        assert!(matches!(
            pi.digital_read(2),
            Err(HwError::WrongMode(2, PinMode::Output))
        ));
    }

    #[test]
    fn test_fail_writes() {
        let pi = EmulatedPi::new();
        pi.pin_mode(0, PinMode::Output).unwrap();
        pi.fail_writes(0, true).unwrap();

        assert!(matches!(
            pi.digital_write(0, Level::High),
            Err(HwError::WriteFailed(0))
        ));
        assert_eq!(pi.rising_edges(0), 0);

        pi.fail_writes(0, false).unwrap();
        pi.digital_write(0, Level::High).unwrap();
        assert_eq!(pi.rising_edges(0), 1);
    }
}
