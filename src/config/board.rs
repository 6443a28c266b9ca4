//! Board wiring (ESP32-C3 access-control accessory).
//!
//! Change these to match your board. ADC1 channels 0-3 sit on GPIO0-3, so
//! the rail control lives on GPIO5.

use crate::hal::{AdcChannel, Level, PinId};

/// Rail power-control output.
pub const POWER_PIN: PinId = 5;

/// Rail is enabled by driving the control pin low.
pub const POWER_ENABLED_LEVEL: Level = Level::Low;

/// Downstream load gate / shutdown indicator.
pub const SHUTDOWN_PIN: PinId = 18;

/// Level written to `SHUTDOWN_PIN` before the radio transmits.
pub const SHUTDOWN_LEVEL: Level = Level::Low;

/// Unlock button input (continuous trigger).
pub const TRIGGER_PIN: PinId = 14;

/// Button pulls the input low when pressed.
pub const TRIGGER_ACTIVE_LEVEL: Level = Level::Low;

/// ADC1 channels sampled by the one-shot trigger.
pub const ADC_CHANNELS: [AdcChannel; 4] = [0, 1, 2, 3];

/// Full-scale voltage at 11/12 dB attenuation.
pub const ADC_REFERENCE_VOLTAGE: f32 = 3.9;

/// 12-bit ADC.
pub const ADC_RESOLUTION: u16 = 4096;
