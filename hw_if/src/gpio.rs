//! Pin driver trait and associated types

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Direction a pin has been configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

/// Errors raised by pin drivers.
#[derive(Debug, thiserror::Error)]
pub enum HwError {
    #[error("Pin {0} has not been configured")]
    PinNotConfigured(u8),

    #[error("Pin {0} is configured as {1:?} which does not support this operation")]
    WrongMode(u8, PinMode),

    #[error("Pin {0} is not available: {1}")]
    PinUnavailable(u8, String),

    #[error("Write to pin {0} failed")]
    WriteFailed(u8),

    #[error("Could not access the GPIO peripheral: {0}")]
    Peripheral(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Access to a set of digital pins.
///
/// One driver is shared between every motor worker thread, so all methods
/// take `&self` and implementations must synchronise internally.
pub trait PinDriver: Send + Sync {
    /// Configure the direction of a pin. Must be called before the pin is
    /// read or written.
    fn pin_mode(&self, pin: u8, mode: PinMode) -> Result<(), HwError>;

    /// Drive an output pin to the given level.
    fn digital_write(&self, pin: u8, level: Level) -> Result<(), HwError>;

    /// Read the current level of an input pin.
    fn digital_read(&self, pin: u8) -> Result<Level, HwError>;
}
