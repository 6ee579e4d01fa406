//! Fault state for PwmSiggen.
//!
//! The generator has no display: a failure shows up only as the output not
//! changing. This module records why, for the diagnostic log and for tests.
//!
//! Faults never stop the main loop. A hardware fault leaves the generator
//! in a degraded state (no output) until the next start, increment or
//! decrement succeeds in reconfiguring the PWM.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::error::{HardwareError, TableError};

/// Fault codes indicating why the output is not playing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// PWM, timer, clock or input could not be acquired.
    /// Data: `Resource` discriminant.
    HardwareUnavailable = 1,

    /// Table generation overflowed the capacity despite the clamps.
    /// Data: requested PWM cycles per period.
    TableTooLarge = 2,

    /// Table generation produced no samples.
    DegenerateTable = 3,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::HardwareUnavailable,
            2 => FaultCode::TableTooLarge,
            3 => FaultCode::DegenerateTable,
            _ => FaultCode::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::None => "none",
            FaultCode::HardwareUnavailable => "hardware unavailable",
            FaultCode::TableTooLarge => "table too large",
            FaultCode::DegenerateTable => "degenerate table",
        }
    }
}

/// Thread-safe fault state.
///
/// Set by the main loop when a reconfigure fails, cleared when one
/// succeeds. Readable from anywhere.
pub struct FaultState {
    /// True if fault is active.
    active: AtomicBool,

    /// Fault code (reason for fault).
    code: AtomicU8,

    /// Additional data (resource id, requested table length).
    data: AtomicU32,

    /// Total fault count since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Record a fault and bump the counter.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    /// Record a hardware acquisition failure.
    #[inline]
    pub fn set_hardware(&self, e: &HardwareError) {
        self.set(FaultCode::HardwareUnavailable, e.resource as u32);
    }

    /// Record a table generation failure.
    #[inline]
    pub fn set_table(&self, e: &TableError) {
        match e {
            TableError::TooLarge { requested, .. } => {
                self.set(FaultCode::TableTooLarge, *requested as u32)
            }
            TableError::Degenerate => self.set(FaultCode::DegenerateTable, 0),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Get fault code (only meaningful if `is_active()` is true).
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear the active flag. The counter is kept for diagnostics.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}
