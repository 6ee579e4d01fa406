//! Duty-cycle table generator.
//!
//! Pure logic, no hardware dependencies. Converts a target frequency into
//! one period of a sine wave expressed as PWM compare values.
//!
//! ```text
//! clocks_per_cycle  = floor(clock_hz / cycle_hz)                 (PWM top)
//! cycles_per_period = floor((clock_hz / clocks_per_cycle) / f)
//! value[k]          = round(top * (0.5 * sin(2πk / cycles) + 0.5))
//! ```
//!
//! The sine is offset into [0, 1] so a duty value is never negative.
//! Uses floating point: call from the main loop, never from an interrupt.

use core::f32::consts::TAU;

use heapless::Vec;

use crate::config::{ClockParameters, MAX_TABLE_CAPACITY};
use crate::error::TableError;

/// One period of duty-cycle values, bounded to `N` entries.
///
/// Owned by the playback controller and rewritten in place on every
/// frequency change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DutyCycleTable<const N: usize = MAX_TABLE_CAPACITY> {
    values: Vec<u16, N>,
    top: u16,
}

impl<const N: usize> DutyCycleTable<N> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            values: Vec::new(),
            top: 0,
        }
    }

    /// Build a fresh table for `freq_hz`.
    pub fn generate(clock: &ClockParameters, freq_hz: f32) -> Result<Self, TableError> {
        let mut table = Self::new();
        table.regenerate(clock, freq_hz)?;
        Ok(table)
    }

    /// Rewrite the table for `freq_hz`, using the full capacity `N`.
    ///
    /// Returns the PWM top count.
    #[inline]
    pub fn regenerate(&mut self, clock: &ClockParameters, freq_hz: f32) -> Result<u16, TableError> {
        self.regenerate_within(clock, freq_hz, self.capacity())
    }

    /// Rewrite the table for `freq_hz`, using at most `limit` entries.
    ///
    /// The size is checked before anything is written: on error the
    /// previous contents are left untouched.
    pub fn regenerate_within(
        &mut self,
        clock: &ClockParameters,
        freq_hz: f32,
        limit: usize,
    ) -> Result<u16, TableError> {
        let capacity = limit.min(self.capacity());
        let top = clock.clocks_per_cycle();
        let cycles = cycles_per_period(clock, freq_hz);

        if cycles == 0 || top == 0 {
            return Err(TableError::Degenerate);
        }
        if cycles > capacity {
            return Err(TableError::TooLarge {
                requested: cycles,
                capacity,
            });
        }

        let top = top.min(u16::MAX as u32) as u16;
        self.values.clear();
        for k in 0..cycles {
            let value = duty_value(top, k, cycles);
            // Length was checked against capacity above.
            if self.values.push(value).is_err() {
                return Err(TableError::TooLarge {
                    requested: cycles,
                    capacity,
                });
            }
        }
        self.top = top;
        Ok(top)
    }

    /// Duty values, one per PWM cycle.
    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        &self.values
    }

    /// PWM top count the values were computed against.
    #[inline]
    pub fn top(&self) -> u16 {
        self.top
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Compiled capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for DutyCycleTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// PWM cycles that make up one period of `freq_hz`.
///
/// Returns 0 for non-positive or non-finite frequencies.
#[inline]
pub fn cycles_per_period(clock: &ClockParameters, freq_hz: f32) -> usize {
    if !(freq_hz > 0.0) || !freq_hz.is_finite() {
        return 0;
    }
    let rate = clock.output_cycle_hz();
    // `as` saturates, so very low frequencies land far above any capacity.
    libm::floorf(rate / freq_hz) as usize
}

/// Build a table of the default capacity and return it with its top count.
pub fn generate_table(
    clock: &ClockParameters,
    freq_hz: f32,
) -> Result<(DutyCycleTable, u16), TableError> {
    let table = DutyCycleTable::generate(clock, freq_hz)?;
    let top = table.top();
    Ok((table, top))
}

#[inline]
fn duty_value(top: u16, k: usize, cycles: usize) -> u16 {
    let phase = TAU * k as f32 / cycles as f32;
    let amplitude = 0.5 * libm::sinf(phase) + 0.5;
    let value = libm::roundf(top as f32 * amplitude);
    (value.max(0.0) as u16).min(top)
}
