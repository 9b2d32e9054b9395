//! [`PinDriver`] implementation for the Raspberry Pi GPIO bank, using `rppal`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use log::info;
use parking_lot::Mutex;
use rppal::gpio::{self, Gpio, InputPin, OutputPin};

use crate::gpio::{HwError, Level, PinDriver, PinMode};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The Raspberry Pi GPIO peripheral.
pub struct RaspiGpio {
    gpio: Gpio,
    pins: Mutex<HashMap<u8, RaspiPin>>,
}

enum RaspiPin {
    Input(InputPin),
    Output(OutputPin),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RaspiGpio {
    /// Open the GPIO peripheral.
    pub fn new() -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(|e| HwError::Peripheral(e.to_string()))?;

        Ok(Self {
            gpio,
            pins: Mutex::new(HashMap::new()),
        })
    }
}

impl PinDriver for RaspiGpio {
    fn pin_mode(&self, pin: u8, mode: PinMode) -> Result<(), HwError> {
        info!("Set pin {} to mode {:?}", pin, mode);

        let p = self
            .gpio
            .get(pin)
            .map_err(|e| HwError::PinUnavailable(pin, e.to_string()))?;

        let p = match mode {
            PinMode::Input => RaspiPin::Input(p.into_input()),
            PinMode::Output => RaspiPin::Output(p.into_output()),
        };

        self.pins.lock().insert(pin, p);

        Ok(())
    }

    fn digital_write(&self, pin: u8, level: Level) -> Result<(), HwError> {
        match self.pins.lock().get_mut(&pin) {
            Some(RaspiPin::Output(p)) => {
                match level {
                    Level::High => p.set_high(),
                    Level::Low => p.set_low(),
                }
                Ok(())
            }
            Some(RaspiPin::Input(_)) => Err(HwError::WrongMode(pin, PinMode::Input)),
            None => Err(HwError::PinNotConfigured(pin)),
        }
    }

    fn digital_read(&self, pin: u8) -> Result<Level, HwError> {
        match self.pins.lock().get(&pin) {
            Some(RaspiPin::Input(p)) => Ok(match p.read() {
                gpio::Level::High => Level::High,
                gpio::Level::Low => Level::Low,
            }),
            Some(RaspiPin::Output(_)) => Err(HwError::WrongMode(pin, PinMode::Output)),
            None => Err(HwError::PinNotConfigured(pin)),
        }
    }
}
