//! Hardware Abstraction Layer for RustEspNowRelay.
//!
//! Capability traits the node logic is written against, plus thin wrappers
//! around ESP-IDF peripherals that implement them on target.
//! Business logic stays in core modules, HAL is just I/O.

pub mod io;
pub mod radio;

#[cfg(target_os = "espidf")]
pub mod esp;

pub use io::{AdcChannel, HardwareIo, IoError, Level, PinDirection, PinId, Pull};
pub use radio::{Interface, RadioTransport, SendOutcome, TransportError};
