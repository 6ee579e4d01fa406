//! Signal profiles.
//!
//! Both profiles share the same state machine and table capacity. They
//! differ only in clocking, start frequency and safety timeout.

use super::{ClockParameters, SignalConfig, MAX_TABLE_CAPACITY};

/// Board LED pin (active low).
pub const LED_PIN: u8 = 2;

/// Auxiliary output pin for the audio profile.
pub const AUX_PIN: u8 = 4;

/// Button pins, in `ButtonLine` order (decrement, increment, stop, start).
pub const BUTTON_PINS: [u8; 4] = [5, 6, 7, 15];

/// UART1 TX pin for the diagnostic log.
pub const LOG_TX_PIN: u8 = 17;

/// Diagnostic log baud rate.
pub const LOG_BAUD_RATE: u32 = 115_200;

/// Slow sine on the board LED: 125 kHz clock, 100 Hz PWM, 0.25 Hz start, 30 s timeout.
pub const LED_PROFILE: SignalConfig = SignalConfig {
    clock: ClockParameters::new(125_000, 100),
    initial_hz: 0.25,
    safety_timeout_ms: 30_000,
    table_capacity: MAX_TABLE_CAPACITY,
    output_pin: LED_PIN,
    idle_high: true,
};

/// Audible sine on the aux pin: 16 MHz clock, 160 kHz PWM, 1 kHz start, 10 s timeout.
pub const AUDIO_PROFILE: SignalConfig = SignalConfig {
    clock: ClockParameters::new(16_000_000, 160_000),
    initial_hz: 1_000.0,
    safety_timeout_ms: 10_000,
    table_capacity: MAX_TABLE_CAPACITY,
    output_pin: AUX_PIN,
    idle_high: false,
};
