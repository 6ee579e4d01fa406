//! Error types for the signal generator.
//!
//! All failures are plain values returned to the caller and inspected in the
//! same loop iteration that produced them. Nothing here unwinds.

use core::fmt;

/// Duty-cycle table generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The period needs more PWM cycles than the table can hold.
    TooLarge {
        /// PWM cycles per period for the requested frequency.
        requested: usize,
        /// Fixed table capacity.
        capacity: usize,
    },
    /// The requested frequency is at or above the PWM cycle rate, so a
    /// period rounds down to zero samples.
    Degenerate,
}

impl TableError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooLarge { .. } => "T01",
            Self::Degenerate => "T02",
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { requested, capacity } => write!(
                f,
                "{}: table too large ({} cycles, capacity {})",
                self.code(),
                requested,
                capacity
            ),
            Self::Degenerate => write!(f, "{}: degenerate table (no samples per period)", self.code()),
        }
    }
}

/// Hardware resource a capability failed to acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Resource {
    Clock = 1,
    Pwm = 2,
    Timer = 3,
    Input = 4,
}

impl Resource {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Clock),
            2 => Some(Self::Pwm),
            3 => Some(Self::Timer),
            4 => Some(Self::Input),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Pwm => "pwm",
            Self::Timer => "timer",
            Self::Input => "input",
        }
    }
}

/// A hardware capability could not be acquired.
///
/// Never retried automatically. The next user action that needs the
/// hardware tries again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareError {
    /// Which capability failed.
    pub resource: Resource,
    /// Driver-specific status code (0 if the driver has none).
    pub code: i32,
}

impl HardwareError {
    pub const fn new(resource: Resource, code: i32) -> Self {
        Self { resource, code }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H01: {} unavailable (code {})", self.resource.as_str(), self.code)
    }
}

/// Invalid signal configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// PWM cycle rate is higher than the base clock.
    ZeroClocksPerCycle,
    /// Top count does not fit a 15-bit duty word.
    TopCountOverflow,
    /// Minimum frequency is above the maximum frequency.
    EmptyBounds,
    /// Initial frequency lies outside the bounds.
    InitialOutOfRange,
    /// Safety timeout of zero would stop playback immediately.
    ZeroTimeout,
    /// Configured capacity is zero or exceeds the compiled table size.
    CapacityOutOfRange,
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroClocksPerCycle => "C01",
            Self::TopCountOverflow => "C02",
            Self::EmptyBounds => "C03",
            Self::InitialOutOfRange => "C04",
            Self::ZeroTimeout => "C05",
            Self::CapacityOutOfRange => "C06",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::ZeroClocksPerCycle => "cycle rate exceeds clock rate",
            Self::TopCountOverflow => "top count exceeds 15 bits",
            Self::EmptyBounds => "min frequency above max frequency",
            Self::InitialOutOfRange => "initial frequency out of range",
            Self::ZeroTimeout => "safety timeout is zero",
            Self::CapacityOutOfRange => "capacity outside table limits",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_codes() {
        let e = TableError::TooLarge { requested: 2048, capacity: 1024 };
        let s = format!("{}", e);
        assert!(s.starts_with("T01"));
        assert!(s.contains("2048"));

        let h = HardwareError::new(Resource::Pwm, -3);
        assert_eq!(format!("{}", h), "H01: pwm unavailable (code -3)");

        assert_eq!(format!("{}", ConfigError::ZeroTimeout), "C05: safety timeout is zero");
    }

    #[test]
    fn test_resource_roundtrip() {
        for r in [Resource::Clock, Resource::Pwm, Resource::Timer, Resource::Input] {
            assert_eq!(Resource::from_u8(r as u8), Some(r));
        }
        assert_eq!(Resource::from_u8(0), None);
    }
}
