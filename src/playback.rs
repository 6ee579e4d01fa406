//! Playback controller.
//!
//! Single owner of the duty-cycle table, the PWM capability and the
//! safety timer. Only the main loop calls into it.
//!
//! # Contract
//!
//! - `configure()` always releases before it acquires, even when nothing
//!   is active. Every frequency change pays a full reconfigure; frequency
//!   changes happen at button rate, not sample rate.
//! - `halt()` releases the PWM entirely, drives the idle level and
//!   cancels the safety timer.
//! - Failures are returned, never retried here.

use core::fmt;

use crate::config::{SignalConfig, MAX_TABLE_CAPACITY};
use crate::error::{HardwareError, TableError};
use crate::hal::{CountdownTimer, PwmConfig, PwmOutput, SafetyTimer, TimeoutGate};
use crate::waveform::DutyCycleTable;

/// Why a (re)start did not produce output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
    /// Table could not be generated; hardware was not touched.
    Table(TableError),
    /// PWM or safety timer could not be acquired; output is idle.
    Hardware(HardwareError),
}

impl From<TableError> for PlaybackError {
    fn from(e: TableError) -> Self {
        PlaybackError::Table(e)
    }
}

impl From<HardwareError> for PlaybackError {
    fn from(e: HardwareError) -> Self {
        PlaybackError::Hardware(e)
    }
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::Table(e) => e.fmt(f),
            PlaybackError::Hardware(e) => e.fmt(f),
        }
    }
}

/// Result of a successful (re)start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started {
    /// PWM cycles per sine period (table length).
    pub cycles: usize,
    /// PWM top count.
    pub top: u16,
}

/// Drives the PWM capability with the current table.
pub struct PlaybackController<'a, P: PwmOutput, T: CountdownTimer, const N: usize = MAX_TABLE_CAPACITY>
{
    pwm: P,
    timer: SafetyTimer<'a, T>,
    table: DutyCycleTable<N>,
    config: SignalConfig,
    active: bool,
}

impl<'a, P: PwmOutput, T: CountdownTimer, const N: usize> PlaybackController<'a, P, T, N> {
    pub fn new(pwm: P, timer: T, gate: &'a TimeoutGate, config: SignalConfig) -> Self {
        Self {
            pwm,
            timer: SafetyTimer::new(timer, gate, config.safety_timeout_ms),
            table: DutyCycleTable::new(),
            config,
            active: false,
        }
    }

    /// Regenerate the table for `freq_hz`, reconfigure and re-arm the timer.
    ///
    /// The timer is armed even if the PWM fails, so a degraded run still
    /// times out. If the timer fails, the output is released: no playback
    /// without a safety timeout.
    pub fn start(&mut self, freq_hz: f32) -> Result<Started, PlaybackError> {
        let top = self
            .table
            .regenerate_within(&self.config.clock, freq_hz, self.config.table_capacity)?;

        let pwm = self.configure();
        let timer = self.timer.arm();

        match (pwm, timer) {
            (Ok(()), Ok(())) => Ok(Started {
                cycles: self.table.len(),
                top,
            }),
            (Err(e), _) => Err(e.into()),
            (Ok(()), Err(e)) => {
                self.release_output();
                Err(e.into())
            }
        }
    }

    /// Release the PWM and re-acquire it with the current table.
    pub fn configure(&mut self) -> Result<(), HardwareError> {
        self.pwm.release();
        self.active = false;

        let config = PwmConfig::for_signal(&self.config, self.table.top());
        if let Err(e) = self.pwm.acquire(&config, self.table.as_slice()) {
            self.pwm.drive_idle(self.config.idle_high);
            return Err(e);
        }
        self.active = true;
        Ok(())
    }

    /// Stop playback: cancel the timer, release the PWM, drive idle level.
    pub fn halt(&mut self) {
        self.timer.disarm();
        self.release_output();
    }

    fn release_output(&mut self) {
        self.pwm.release();
        self.pwm.drive_idle(self.config.idle_high);
        self.active = false;
    }

    /// True while the PWM is acquired and looping.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn table(&self) -> &DutyCycleTable<N> {
        &self.table
    }

    #[inline]
    pub fn is_timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    pub fn timer(&self) -> &T {
        self.timer.timer()
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }
}
