//! Module: config
//!
//! Purpose: Build-time signal configuration for PwmSiggen.
//!
//! Architecture:
//! - `ClockParameters`: PWM base clock and cycle rate, never mutated
//! - `SignalConfig`: clock + initial frequency + safety timeout + table capacity
//! - Profiles (`profiles.rs`): LED and audio presets, selected by cargo feature
//! - `CONFIG`: the active profile
//!
//! Frequency bounds are derived from the clock and the table capacity,
//! then checked by `SignalConfig::validate()` at boot.

pub mod profiles;

pub use profiles::{
    AUDIO_PROFILE, AUX_PIN, BUTTON_PINS, LED_PIN, LED_PROFILE, LOG_BAUD_RATE, LOG_TX_PIN,
};

use crate::error::ConfigError;

/// Compiled duty-cycle table size (entries).
pub const MAX_TABLE_CAPACITY: usize = 1024;

/// Fewest PWM cycles a sine period may use.
pub const MIN_SAMPLES_PER_PERIOD: usize = 4;

/// Largest top count a duty word can hold (bit 15 is the polarity bit).
pub const MAX_TOP_COUNT: u32 = 0x7FFF;

/// Button debounce window in milliseconds.
pub const DEBOUNCE_MS: u32 = 50;

/// The profile the firmware boots with.
#[cfg(not(feature = "audio-output"))]
pub const CONFIG: SignalConfig = LED_PROFILE;

/// The profile the firmware boots with.
#[cfg(feature = "audio-output")]
pub const CONFIG: SignalConfig = AUDIO_PROFILE;

/// PWM clocking, fixed at build time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockParameters {
    /// PWM base clock in Hz.
    pub clock_hz: u32,
    /// PWM cycles per second requested from the base clock.
    pub cycle_hz: u32,
}

impl ClockParameters {
    pub const fn new(clock_hz: u32, cycle_hz: u32) -> Self {
        Self { clock_hz, cycle_hz }
    }

    /// Base clock ticks per PWM cycle (the PWM top count).
    #[inline]
    pub const fn clocks_per_cycle(&self) -> u32 {
        if self.cycle_hz == 0 {
            0
        } else {
            self.clock_hz / self.cycle_hz
        }
    }

    /// Actual PWM cycle rate after integer division of the clock.
    ///
    /// Differs from `cycle_hz` when the clock is not an exact multiple.
    #[inline]
    pub fn output_cycle_hz(&self) -> f32 {
        let top = self.clocks_per_cycle();
        if top == 0 {
            return 0.0;
        }
        self.clock_hz as f32 / top as f32
    }
}

/// Complete signal generator configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalConfig {
    /// PWM clocking.
    pub clock: ClockParameters,
    /// Frequency at boot, in Hz.
    pub initial_hz: f32,
    /// Safety timeout armed on every (re)start, in milliseconds.
    pub safety_timeout_ms: u32,
    /// Usable table entries (at most `MAX_TABLE_CAPACITY`).
    pub table_capacity: usize,
    /// Board pin driven by the PWM.
    pub output_pin: u8,
    /// Level of the pin when playback is stopped.
    pub idle_high: bool,
}

impl Default for SignalConfig {
    fn default() -> Self {
        CONFIG
    }
}

impl SignalConfig {
    /// Lowest frequency whose period still fits the table.
    #[inline]
    pub fn min_frequency(&self) -> f32 {
        if self.table_capacity == 0 {
            return f32::INFINITY;
        }
        self.clock.output_cycle_hz() / self.table_capacity as f32
    }

    /// Highest frequency that keeps at least `MIN_SAMPLES_PER_PERIOD` samples.
    #[inline]
    pub fn max_frequency(&self) -> f32 {
        self.clock.output_cycle_hz() / MIN_SAMPLES_PER_PERIOD as f32
    }

    /// Clamp a frequency into `[min_frequency, max_frequency]`.
    #[inline]
    pub fn clamp_frequency(&self, freq_hz: f32) -> f32 {
        freq_hz.max(self.min_frequency()).min(self.max_frequency())
    }

    /// Check that every frequency in the bounds produces a valid table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let top = self.clock.clocks_per_cycle();
        if top == 0 {
            return Err(ConfigError::ZeroClocksPerCycle);
        }
        if top > MAX_TOP_COUNT {
            return Err(ConfigError::TopCountOverflow);
        }
        if self.table_capacity < MIN_SAMPLES_PER_PERIOD || self.table_capacity > MAX_TABLE_CAPACITY
        {
            return Err(ConfigError::CapacityOutOfRange);
        }
        let (min, max) = (self.min_frequency(), self.max_frequency());
        if min > max {
            return Err(ConfigError::EmptyBounds);
        }
        if !(self.initial_hz >= min && self.initial_hz <= max) {
            return Err(ConfigError::InitialOutOfRange);
        }
        if self.safety_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_profile_bounds() {
        let cfg = LED_PROFILE;
        assert_eq!(cfg.clock.clocks_per_cycle(), 1250);
        assert_eq!(cfg.clock.output_cycle_hz(), 100.0);
        assert_eq!(cfg.min_frequency(), 100.0 / 1024.0);
        assert_eq!(cfg.max_frequency(), 25.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_audio_profile_bounds() {
        let cfg = AUDIO_PROFILE;
        assert_eq!(cfg.clock.clocks_per_cycle(), 100);
        assert_eq!(cfg.min_frequency(), 156.25);
        assert_eq!(cfg.max_frequency(), 40_000.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_clock() {
        let mut cfg = LED_PROFILE;
        cfg.clock = ClockParameters::new(100, 200);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroClocksPerCycle));

        cfg.clock = ClockParameters::new(16_000_000, 100);
        assert_eq!(cfg.validate(), Err(ConfigError::TopCountOverflow));
    }

    #[test]
    fn test_validate_rejects_initial_out_of_range() {
        let mut cfg = LED_PROFILE;
        cfg.initial_hz = 50.0;
        assert_eq!(cfg.validate(), Err(ConfigError::InitialOutOfRange));

        cfg.initial_hz = 0.01;
        assert_eq!(cfg.validate(), Err(ConfigError::InitialOutOfRange));
    }

    #[test]
    fn test_validate_rejects_capacity_and_timeout() {
        let mut cfg = LED_PROFILE;
        cfg.table_capacity = MAX_TABLE_CAPACITY + 1;
        assert_eq!(cfg.validate(), Err(ConfigError::CapacityOutOfRange));

        let mut cfg = LED_PROFILE;
        cfg.safety_timeout_ms = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn test_clamp_frequency() {
        let cfg = LED_PROFILE;
        assert_eq!(cfg.clamp_frequency(1000.0), 25.0);
        assert_eq!(cfg.clamp_frequency(0.0), cfg.min_frequency());
        assert_eq!(cfg.clamp_frequency(1.0), 1.0);
    }
}
