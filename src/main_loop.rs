//! Main loop: drains the event bus and drives the playback controller.
//!
//! One `poll()` per iteration:
//!
//! 1. `drain_all()` once; events posted after this wait for the next poll.
//! 2. Dispatch in fixed order Stop > Start > Increment > Decrement. A Stop
//!    in the batch swallows a Start from the same batch: a safety stop
//!    always wins over a concurrent user request.
//! 3. Every outcome is inspected here: failures are logged and recorded in
//!    `FaultState`, then the loop carries on.

use crate::config::SignalConfig;
use crate::error::{ConfigError, HardwareError};
use crate::events::{Event, EventBus, PendingEvents};
use crate::fault::FaultState;
use crate::fsm::{Action, FrequencyStateMachine, PlaybackState};
use crate::hal::{CountdownTimer, PwmOutput, ReferenceClock};
use crate::logging::LogStream;
use crate::playback::{PlaybackController, PlaybackError};
use crate::{diag_debug, diag_error, diag_info, diag_warn};

/// Why boot failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    Config(ConfigError),
    Hardware(HardwareError),
}

impl From<ConfigError> for BootError {
    fn from(e: ConfigError) -> Self {
        BootError::Config(e)
    }
}

impl From<HardwareError> for BootError {
    fn from(e: HardwareError) -> Self {
        BootError::Hardware(e)
    }
}

impl core::fmt::Display for BootError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BootError::Config(e) => e.fmt(f),
            BootError::Hardware(e) => e.fmt(f),
        }
    }
}

/// Validate the configuration and start the reference clock.
///
/// Must succeed before any timer or PWM is touched.
pub fn boot<C: ReferenceClock>(clock: &mut C, config: &SignalConfig) -> Result<(), BootError> {
    config.validate()?;
    clock.start()?;
    Ok(())
}

/// What one `poll()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollReport {
    /// Events drained this iteration.
    pub events: PendingEvents,
    /// Reconfigurations that failed this iteration.
    pub failures: u8,
}

/// Main loop state: frequency machine plus playback controller.
pub struct SignalLoop<'a, P: PwmOutput, T: CountdownTimer> {
    bus: &'a EventBus,
    fault: &'a FaultState,
    log: &'a LogStream,
    fsm: FrequencyStateMachine,
    playback: PlaybackController<'a, P, T>,
}

impl<'a, P: PwmOutput, T: CountdownTimer> SignalLoop<'a, P, T> {
    pub fn new(
        bus: &'a EventBus,
        fault: &'a FaultState,
        log: &'a LogStream,
        playback: PlaybackController<'a, P, T>,
    ) -> Self {
        Self {
            bus,
            fault,
            log,
            fsm: FrequencyStateMachine::new(playback.config()),
            playback,
        }
    }

    /// Run one iteration. Never blocks.
    pub fn poll(&mut self, now_us: i64) -> PollReport {
        let events = self.bus.drain_all();
        let mut report = PollReport {
            events,
            failures: 0,
        };

        let mut batch = events;
        if batch.contains(PendingEvents::STOP) && batch.contains(PendingEvents::START) {
            batch.remove(PendingEvents::START);
            diag_warn!(self.log, now_us, "start dropped: stop pending");
        }

        for event in batch.in_priority_order() {
            if !self.dispatch(event, now_us) {
                report.failures = report.failures.saturating_add(1);
            }
        }
        report
    }

    /// Returns `false` if a reconfiguration failed.
    fn dispatch(&mut self, event: Event, now_us: i64) -> bool {
        let action = self.fsm.handle(event, self.playback.is_active());

        match action {
            Action::None => {
                diag_debug!(
                    self.log,
                    now_us,
                    "{}: {} Hz ({:?})",
                    event.as_str(),
                    self.fsm.frequency(),
                    self.fsm.state()
                );
                true
            }
            Action::Halt => {
                self.playback.halt();
                diag_info!(self.log, now_us, "stop: output idle");
                true
            }
            Action::Play(freq_hz) => self.play(event, freq_hz, now_us),
        }
    }

    fn play(&mut self, event: Event, freq_hz: f32, now_us: i64) -> bool {
        match self.playback.start(freq_hz) {
            Ok(started) => {
                if self.fault.is_active() {
                    diag_info!(self.log, now_us, "output recovered");
                }
                self.fault.clear();
                diag_info!(
                    self.log,
                    now_us,
                    "{}: {} Hz, {} cycles, top {}",
                    event.as_str(),
                    freq_hz,
                    started.cycles,
                    started.top
                );
                true
            }
            Err(PlaybackError::Table(e)) => {
                self.fault.set_table(&e);
                diag_error!(self.log, now_us, "{}: {} at {} Hz", event.as_str(), e, freq_hz);
                false
            }
            Err(PlaybackError::Hardware(e)) => {
                self.fault.set_hardware(&e);
                diag_warn!(self.log, now_us, "{}: {}, output degraded", event.as_str(), e);
                false
            }
        }
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.fsm.state()
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        self.fsm.frequency()
    }

    /// Running with no output because the last reconfigure failed.
    #[inline]
    pub fn is_degraded(&self) -> bool {
        self.fsm.is_running() && !self.playback.is_active()
    }

    pub fn fsm(&self) -> &FrequencyStateMachine {
        &self.fsm
    }

    pub fn playback(&self) -> &PlaybackController<'a, P, T> {
        &self.playback
    }
}
