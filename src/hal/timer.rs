//! Safety countdown.
//!
//! Armed on every (re)start of playback. On expiry the board glue calls
//! `TimeoutGate::on_expired`, which posts `Stop` exactly like the stop
//! button does. Cancelled whenever a stop is processed.
//!
//! ```text
//! Main loop                        Timer ISR
//! ─────────                        ─────────
//! SafetyTimer::arm()   ─┐
//! SafetyTimer::disarm() ├─▶ TimeoutGate ◀── on_expired() ──▶ EventBus::post(Stop)
//!                       ┘   (atomic armed bit)
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::HardwareError;
use crate::events::{Event, EventBus};

/// One-shot hardware countdown.
pub trait CountdownTimer {
    /// Clear the counter and start counting toward `timeout_ms`.
    ///
    /// Restarting an armed timer starts the full duration again.
    fn restart(&mut self, timeout_ms: u32) -> Result<(), HardwareError>;

    /// Stop the countdown. No-op if not armed.
    fn cancel(&mut self);
}

/// Interrupt-shared half of the safety timer.
///
/// Lives in a static next to the event bus. An expiry that races a
/// disarm is dropped instead of posting a stale `Stop`.
pub struct TimeoutGate {
    armed: AtomicBool,
    expirations: AtomicU32,
}

impl TimeoutGate {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            expirations: AtomicU32::new(0),
        }
    }

    /// Expiry handler (interrupt context).
    ///
    /// Returns `true` if a `Stop` was posted.
    #[inline]
    pub fn on_expired(&self, bus: &EventBus) -> bool {
        if !self.armed.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.expirations.fetch_add(1, Ordering::Relaxed);
        bus.post(Event::Stop);
        true
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Expirations that posted a stop since boot.
    #[inline]
    pub fn expirations(&self) -> u32 {
        self.expirations.load(Ordering::Relaxed)
    }

    #[inline]
    fn set_armed(&self, armed: bool) {
        self.armed.store(armed, Ordering::Release);
    }
}

impl Default for TimeoutGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Main-loop half of the safety timer: owns the countdown driver.
pub struct SafetyTimer<'a, T: CountdownTimer> {
    timer: T,
    gate: &'a TimeoutGate,
    timeout_ms: u32,
}

impl<'a, T: CountdownTimer> SafetyTimer<'a, T> {
    pub fn new(timer: T, gate: &'a TimeoutGate, timeout_ms: u32) -> Self {
        Self {
            timer,
            gate,
            timeout_ms,
        }
    }

    /// Start (or restart) the full countdown.
    pub fn arm(&mut self) -> Result<(), HardwareError> {
        // Open the gate first: an expiry can only follow a successful restart.
        self.gate.set_armed(true);
        if let Err(e) = self.timer.restart(self.timeout_ms) {
            self.gate.set_armed(false);
            return Err(e);
        }
        Ok(())
    }

    /// Cancel the countdown.
    pub fn disarm(&mut self) {
        self.gate.set_armed(false);
        self.timer.cancel();
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.gate.is_armed()
    }

    #[inline]
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Access the underlying countdown.
    pub fn timer(&self) -> &T {
        &self.timer
    }
}
