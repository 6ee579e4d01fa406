//! Hardware capabilities consumed by the core.
//!
//! The core never calls a peripheral driver directly. Board glue implements
//! these traits; host tests substitute fakes that record every call.
//!
//! - `ReferenceClock`: low-frequency clock, started once at boot
//! - `PwmOutput`: looped duty-cycle playback on one pin
//! - `CountdownTimer`: one-shot safety countdown
//! - Buttons: edge callbacks feed `ButtonBank`, which posts to the event bus

pub mod buttons;
pub mod pwm;
pub mod timer;

pub use buttons::{ButtonBank, ButtonLine, EdgeOutcome};
pub use pwm::{CountMode, LoadMode, PwmConfig, PwmOutput};
pub use timer::{CountdownTimer, SafetyTimer, TimeoutGate};

use crate::error::HardwareError;

/// Low-frequency reference clock.
///
/// Must be running before any timer or PWM is used.
pub trait ReferenceClock {
    /// Request the clock. Idempotent.
    fn start(&mut self) -> Result<(), HardwareError>;
}
