//! Hardware I/O capability: digital pins and one-shot analog sampling.

use core::fmt;
use core::ops::Not;

/// GPIO number.
pub type PinId = u8;

/// ADC channel number.
pub type AdcChannel = u8;

/// Digital pin level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Pin direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
}

/// Internal pull resistor selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pull {
    None,
    Up,
    Down,
}

/// Hardware I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// Pin number not usable on this board
    InvalidPin(PinId),
    /// ADC channel not configured or not present
    InvalidChannel(AdcChannel),
    /// Driver returned an error code
    Driver(i32),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "invalid pin GPIO{}", pin),
            Self::InvalidChannel(ch) => write!(f, "invalid ADC channel {}", ch),
            Self::Driver(code) => write!(f, "driver error {}", code),
        }
    }
}

/// Digital/analog I/O consumed by the power sequencer and the poll loop.
///
/// Every operation is synchronous and may fail. Callers treat any failure as
/// fatal: there is no path to recover GPIO/ADC access mid-cycle.
pub trait HardwareIo {
    /// Reset a pin and set its direction and pull.
    fn configure_pin(&mut self, pin: PinId, direction: PinDirection, pull: Pull)
        -> Result<(), IoError>;

    /// Drive an output pin.
    fn set_level(&mut self, pin: PinId, level: Level) -> Result<(), IoError>;

    /// Read an input pin.
    fn read_level(&mut self, pin: PinId) -> Result<Level, IoError>;

    /// Take one raw ADC reading.
    fn sample_analog(&mut self, channel: AdcChannel) -> Result<u16, IoError>;
}
