//! PWM output capability.

use crate::config::SignalConfig;
use crate::error::HardwareError;

/// PWM counter direction. Duty values assume an edge-aligned counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Count 0..top, then wrap.
    Up,
}

/// How duty values are loaded from the table into the compare channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// One value drives every channel.
    Common,
}

/// Everything a PWM driver needs to start looped playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmConfig {
    /// Board pin driven by the PWM.
    pub output_pin: u8,
    /// Base clock in Hz.
    pub base_clock_hz: u32,
    /// Counter top (clocks per PWM cycle).
    pub top_count: u16,
    pub count_mode: CountMode,
    pub load_mode: LoadMode,
}

impl PwmConfig {
    /// Single-channel up-counting configuration for `top_count`.
    pub fn for_signal(config: &SignalConfig, top_count: u16) -> Self {
        Self {
            output_pin: config.output_pin,
            base_clock_hz: config.clock.clock_hz,
            top_count,
            count_mode: CountMode::Up,
            load_mode: LoadMode::Common,
        }
    }
}

/// Looped duty-cycle playback on one output pin.
///
/// # Contract
///
/// - `acquire` starts indefinite looped playback of `table`; the table
///   repeats until `release`.
/// - `release` frees the hardware entirely (not a pause). Safe to call
///   when nothing is acquired.
/// - Release/acquire may repeat any number of times without leaking state.
pub trait PwmOutput {
    /// Configure the peripheral and start looping over `table`.
    fn acquire(&mut self, config: &PwmConfig, table: &[u16]) -> Result<(), HardwareError>;

    /// Stop playback and free the peripheral.
    fn release(&mut self);

    /// Drive the output pin to its idle level (`high` or low).
    fn drive_idle(&mut self, high: bool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LED_PROFILE;

    #[test]
    fn test_config_for_signal() {
        let cfg = PwmConfig::for_signal(&LED_PROFILE, 1250);
        assert_eq!(cfg.output_pin, LED_PROFILE.output_pin);
        assert_eq!(cfg.base_clock_hz, 125_000);
        assert_eq!(cfg.top_count, 1250);
        assert_eq!(cfg.count_mode, CountMode::Up);
        assert_eq!(cfg.load_mode, LoadMode::Common);
    }
}
